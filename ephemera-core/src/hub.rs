//! Ephemeral message fan-out.
//!
//! Uses a tokio broadcast channel so one publish reaches every session
//! attached to the document. Ephemeral payloads never touch the document
//! history: a receiver that lags behind simply loses the oldest messages.
//!
//! The publisher is itself a subscriber, so sessions see their own
//! messages echoed back and must filter them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Encoded ephemeral message, shared between all receivers.
pub type EphemeralPayload = Arc<Vec<u8>>;

/// Snapshot of hub counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubStats {
    pub messages_sent: u64,
    /// Publishes that reached no subscriber at all.
    pub messages_dropped: u64,
    pub subscribers: usize,
}

#[derive(Default)]
struct AtomicHubStats {
    messages_sent: AtomicU64,
    messages_dropped: AtomicU64,
}

pub struct EphemeralHub {
    sender: broadcast::Sender<EphemeralPayload>,
    capacity: usize,
    stats: AtomicHubStats,
}

impl std::fmt::Debug for EphemeralHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralHub")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

impl Default for EphemeralHub {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EphemeralHub {
    /// Create a hub buffering up to `capacity` messages per receiver.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            capacity,
            stats: AtomicHubStats::default(),
        }
    }

    /// Publish a payload to every subscriber. Returns the number of receivers.
    pub fn publish(&self, payload: Vec<u8>) -> usize {
        self.publish_shared(Arc::new(payload))
    }

    pub fn publish_shared(&self, payload: EphemeralPayload) -> usize {
        self.stats.messages_sent.fetch_add(1, Ordering::Relaxed);
        match self.sender.send(payload) {
            Ok(count) => count,
            Err(_) => {
                self.stats.messages_dropped.fetch_add(1, Ordering::Relaxed);
                log::trace!("ephemeral message published with no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EphemeralPayload> {
        self.sender.subscribe()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            messages_sent: self.stats.messages_sent.load(Ordering::Relaxed),
            messages_dropped: self.stats.messages_dropped.load(Ordering::Relaxed),
            subscribers: self.sender.receiver_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    #[test]
    fn test_publish_without_subscribers() {
        let hub = EphemeralHub::new(8);
        assert_eq!(hub.publish(vec![1, 2, 3]), 0);

        let stats = hub.stats();
        assert_eq!(stats.messages_sent, 1);
        assert_eq!(stats.messages_dropped, 1);
        assert_eq!(stats.subscribers, 0);
    }

    #[tokio::test]
    async fn test_fan_out_to_all_subscribers() {
        let hub = EphemeralHub::new(8);
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();

        assert_eq!(hub.publish(b"cursor".to_vec()), 2);

        assert_eq!(a.recv().await.unwrap().as_slice(), b"cursor");
        assert_eq!(b.recv().await.unwrap().as_slice(), b"cursor");
        assert!(matches!(a.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(hub.stats().subscribers, 2);
    }

    #[tokio::test]
    async fn test_lagging_receiver_loses_oldest() {
        let hub = EphemeralHub::new(2);
        let mut rx = hub.subscribe();

        for i in 0..5u8 {
            hub.publish(vec![i]);
        }

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(3))));
        assert_eq!(rx.recv().await.unwrap().as_slice(), &[3]);
        assert_eq!(rx.recv().await.unwrap().as_slice(), &[4]);
    }
}
