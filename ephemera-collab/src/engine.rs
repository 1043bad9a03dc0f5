//! Document engine seam consumed by the sync driver and the agent.

use ephemera_core::{DocHandle, EphemeralPayload, Splice};
use tokio::sync::{broadcast, watch};

use crate::error::SyncResult;

/// What the cursor layer needs from a collaborative document.
///
/// Positions are character offsets. `subscribe_changes` yields a revision
/// that moves on every committed edit, local or remote.
pub trait DocumentEngine: Send + Sync + 'static {
    fn current_text(&self) -> String;

    fn document_length(&self) -> usize {
        self.current_text().chars().count()
    }

    fn apply_change(&self, splice: &Splice) -> SyncResult<()>;

    fn broadcast_ephemeral(&self, payload: Vec<u8>) -> SyncResult<()>;

    fn subscribe_ephemeral(&self) -> broadcast::Receiver<EphemeralPayload>;

    fn subscribe_changes(&self) -> watch::Receiver<u64>;
}

impl DocumentEngine for DocHandle {
    fn current_text(&self) -> String {
        self.text().text()
    }

    fn document_length(&self) -> usize {
        self.text().len()
    }

    fn apply_change(&self, splice: &Splice) -> SyncResult<()> {
        self.text()
            .splice(splice.position, splice.delete, &splice.insert)?;
        Ok(())
    }

    fn broadcast_ephemeral(&self, payload: Vec<u8>) -> SyncResult<()> {
        // zero receivers is fine: nobody else has joined yet
        self.hub().publish(payload);
        Ok(())
    }

    fn subscribe_ephemeral(&self) -> broadcast::Receiver<EphemeralPayload> {
        self.hub().subscribe()
    }

    fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.text().subscribe()
    }
}
