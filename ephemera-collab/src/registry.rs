//! Peer cursor registry: the authoritative set of remote cursors.
//!
//! One entry per peer, replaced wholesale on every update. Iteration
//! follows insertion/update order (most recently updated last), which keeps
//! rendering stable but carries no meaning.
//!
//! Mutation is crate-private: only the sync driver writes here.

use indexmap::IndexMap;

use crate::message::Cursor;

/// Age after which a silent peer is evicted.
pub const DEFAULT_STALE_TIMEOUT_MS: u64 = 10_000;

/// Result of [`PeerCursorRegistry::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
    /// Older than the stored entry; only when out-of-order rejection is on.
    RejectedOutOfOrder,
}

#[derive(Debug, Default)]
pub struct PeerCursorRegistry {
    cursors: IndexMap<String, Cursor>,
    reject_out_of_order: bool,
}

impl PeerCursorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that ignores messages timestamped before the stored entry.
    pub fn rejecting_out_of_order() -> Self {
        Self {
            reject_out_of_order: true,
            ..Self::default()
        }
    }

    pub(crate) fn upsert(&mut self, cursor: Cursor) -> UpsertOutcome {
        if self.reject_out_of_order {
            if let Some(existing) = self.cursors.get(&cursor.peer_id) {
                if cursor.timestamp < existing.timestamp {
                    return UpsertOutcome::RejectedOutOfOrder;
                }
            }
        }

        // remove first so the updated peer moves to the end
        let outcome = match self.cursors.shift_remove(&cursor.peer_id) {
            Some(_) => UpsertOutcome::Replaced,
            None => UpsertOutcome::Inserted,
        };
        self.cursors.insert(cursor.peer_id.clone(), cursor);
        outcome
    }

    pub(crate) fn remove(&mut self, peer_id: &str) -> Option<Cursor> {
        self.cursors.shift_remove(peer_id)
    }

    /// Evict every cursor with `now - timestamp > stale_timeout_ms`.
    ///
    /// Returns the evicted peer ids; empty means nothing needs redrawing.
    pub(crate) fn sweep_stale(&mut self, now_ms: u64, stale_timeout_ms: u64) -> Vec<String> {
        let mut removed = Vec::new();
        self.cursors.retain(|peer_id, cursor| {
            let stale = now_ms.saturating_sub(cursor.timestamp) > stale_timeout_ms;
            if stale {
                removed.push(peer_id.clone());
            }
            !stale
        });
        removed
    }

    pub fn values(&self) -> impl Iterator<Item = &Cursor> {
        self.cursors.values()
    }

    pub fn get(&self, peer_id: &str) -> Option<&Cursor> {
        self.cursors.get(peer_id)
    }

    pub fn contains(&self, peer_id: &str) -> bool {
        self.cursors.contains_key(peer_id)
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    /// Owned copy of all cursors, in iteration order.
    pub fn snapshot(&self) -> Vec<Cursor> {
        self.cursors.values().cloned().collect()
    }
}
