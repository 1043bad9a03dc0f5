//! Cursor reporting for AI editing agents.
//!
//! An agent does not render anything; it only tells the humans where it is
//! working. Every edit goes through a minimal splice so the cursor lands on
//! the first changed character and concurrent human edits elsewhere in the
//! document survive.

use std::sync::Arc;

use ephemera_core::compute_splice;

use crate::clock::{Clock, SystemClock};
use crate::engine::DocumentEngine;
use crate::error::SyncResult;
use crate::message::{build_message_at, CursorType, MessageOptions, OperationType};
use crate::peer::LocalPeer;

pub struct AgentEditor<E> {
    engine: E,
    peer: LocalPeer,
    clock: Arc<dyn Clock>,
}

impl<E: DocumentEngine> AgentEditor<E> {
    /// Agent with a fresh id, reporting as an `ai` cursor.
    pub fn new(engine: E, name: impl Into<String>) -> Self {
        Self::with_peer(engine, LocalPeer::new(name).as_ai())
    }

    pub fn with_peer(engine: E, peer: LocalPeer) -> Self {
        Self {
            engine,
            peer,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn peer_id(&self) -> &str {
        &self.peer.peer_id
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Broadcast the agent's cursor, optionally with a selection.
    pub fn report_position(&self, position: usize, anchor: Option<usize>) -> SyncResult<()> {
        let options = MessageOptions {
            color: self.peer.color.clone(),
            ..MessageOptions::default()
        };
        self.broadcast(self.peer.cursor_type, position, anchor, options)
    }

    /// Broadcast a `streaming_edit` cursor while a multi-step edit is in
    /// progress. `partial_pattern` is what humans see next to the name.
    pub fn report_streaming(
        &self,
        position: usize,
        partial_pattern: impl Into<String>,
        operation_type: OperationType,
    ) -> SyncResult<()> {
        let options = MessageOptions {
            color: self.peer.color.clone(),
            partial_pattern: Some(partial_pattern.into()),
            operation_type: Some(operation_type),
        };
        self.broadcast(CursorType::StreamingEdit, position, None, options)
    }

    /// Turn `old` into `new` with a single splice, reporting the cursor at
    /// the edit position first.
    ///
    /// Returns `false` when the texts are equal and nothing was sent.
    pub fn apply_edit(&self, old: &str, new: &str) -> SyncResult<bool> {
        let Some(splice) = compute_splice(old, new) else {
            return Ok(false);
        };

        self.report_position(splice.position, None)?;
        self.engine.apply_change(&splice)?;

        log::info!(
            "Agent {} replaced {} char(s) at {} with {} char(s)",
            self.peer.name,
            splice.delete,
            splice.position,
            splice.insert.chars().count()
        );
        Ok(true)
    }

    /// Replace the whole document with `new_text`, touching only what changed.
    pub fn rewrite(&self, new_text: &str) -> SyncResult<bool> {
        let current = self.engine.current_text();
        self.apply_edit(&current, new_text)
    }

    fn broadcast(
        &self,
        cursor_type: CursorType,
        position: usize,
        anchor: Option<usize>,
        options: MessageOptions,
    ) -> SyncResult<()> {
        let message = build_message_at(
            self.peer.peer_id.clone(),
            self.peer.name.clone(),
            cursor_type,
            position,
            anchor,
            options,
            self.clock.now_ms(),
        );
        self.engine.broadcast_ephemeral(message.encode()?)
    }
}

impl<E> std::fmt::Debug for AgentEditor<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentEditor")
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}
