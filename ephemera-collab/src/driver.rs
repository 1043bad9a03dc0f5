//! Sync driver: the time-driven half of cursor presence.
//!
//! One tokio task per session owns the registry and every timer:
//!
//! ```text
//!  selection_changed() ──mpsc──┐
//!  ephemeral hub ───broadcast──┤
//!  document edits ──────watch──┼──► select! loop ──► throttled broadcast
//!  sweep interval ─────────────┤         │
//!  teardown() ───────oneshot───┘         └──► deferred render ──► surface
//! ```
//!
//! Outbound sends use a fixed throttle window: the first selection change
//! arms a deadline, later changes only replace the pending state, and the
//! latest state goes out when the deadline fires. Renders are deferred until
//! every queued trigger has been handled, so a burst of inbound messages
//! costs one render.

use std::future;
use std::sync::Arc;

use ephemera_core::EphemeralPayload;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::clock::{Clock, SystemClock};
use crate::config::SyncConfig;
use crate::engine::DocumentEngine;
use crate::error::SyncResult;
use crate::message::{self, build_message_at, Cursor, MessageOptions};
use crate::peer::LocalPeer;
use crate::reconcile::reconcile;
use crate::registry::{PeerCursorRegistry, UpsertOutcome};
use crate::surface::DecorationSurface;

/// Local selection as reported by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub head: usize,
    pub anchor: Option<usize>,
}

/// Snapshot of the remote cursors, republished after every registry change.
pub type RemoteCursors = Arc<Vec<Cursor>>;

/// Handle on a running cursor sync session.
///
/// Dropping the handle aborts the worker; [`CursorSync::teardown`] stops it
/// and waits until it has exited.
pub struct CursorSync {
    peer_id: String,
    selections: mpsc::UnboundedSender<Selection>,
    stop: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<()>>,
    remote: watch::Receiver<RemoteCursors>,
}

impl CursorSync {
    /// Start a session on the current tokio runtime.
    pub fn spawn<E, S>(engine: E, surface: S, peer: LocalPeer, config: SyncConfig) -> Self
    where
        E: DocumentEngine,
        S: DecorationSurface,
    {
        Self::spawn_with_clock(engine, surface, peer, config, SystemClock)
    }

    /// Like [`CursorSync::spawn`], reading timestamps from `clock`.
    pub fn spawn_with_clock<E, S, C>(
        engine: E,
        surface: S,
        peer: LocalPeer,
        config: SyncConfig,
        clock: C,
    ) -> Self
    where
        E: DocumentEngine,
        S: DecorationSurface,
        C: Clock,
    {
        // subscribe before spawning so nothing published from here on is missed
        let inbound = engine.subscribe_ephemeral();
        let changes = engine.subscribe_changes();
        let (selection_tx, selection_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel();
        let (remote_tx, remote_rx) = watch::channel(RemoteCursors::default());

        let registry = if config.reject_out_of_order {
            PeerCursorRegistry::rejecting_out_of_order()
        } else {
            PeerCursorRegistry::new()
        };

        let peer_id = peer.peer_id.clone();
        log::info!("Cursor sync started for peer {peer_id}");

        let worker = Worker {
            engine,
            surface,
            clock,
            peer,
            config,
            registry,
            remote: remote_tx,
            pending: None,
            deadline: None,
            render_pending: false,
        };
        let handle = tokio::spawn(worker.run(inbound, selection_rx, changes, stop_rx));

        Self {
            peer_id,
            selections: selection_tx,
            stop: Some(stop_tx),
            worker: Some(handle),
            remote: remote_rx,
        }
    }

    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    /// Report a local selection change; the broadcast is throttled.
    ///
    /// Fails with [`crate::SyncError::Stopped`] once the session is down.
    pub fn selection_changed(&self, head: usize, anchor: Option<usize>) -> SyncResult<()> {
        self.selections.send(Selection { head, anchor })?;
        Ok(())
    }

    /// Latest snapshot of the remote cursors.
    pub fn remote_cursors(&self) -> RemoteCursors {
        self.remote.borrow().clone()
    }

    pub fn subscribe_remote(&self) -> watch::Receiver<RemoteCursors> {
        self.remote.clone()
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    /// Stop the session and wait for the worker to exit.
    ///
    /// A pending throttled send is discarded and no render happens after
    /// this returns. Calling it twice is harmless.
    pub async fn teardown(&mut self) {
        if let Some(stop) = self.stop.take() {
            // the worker may already be gone
            let _ = stop.send(());
        }
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                if e.is_panic() {
                    log::error!("Cursor sync worker for {} panicked", self.peer_id);
                }
            }
        }
    }
}

impl Drop for CursorSync {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

impl std::fmt::Debug for CursorSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorSync")
            .field("peer_id", &self.peer_id)
            .field("running", &self.is_running())
            .finish()
    }
}

// ───────────────────────────────────────────────────────────────────
// Worker task
// ───────────────────────────────────────────────────────────────────

struct Worker<E, S, C> {
    engine: E,
    surface: S,
    clock: C,
    peer: LocalPeer,
    config: SyncConfig,
    registry: PeerCursorRegistry,
    remote: watch::Sender<RemoteCursors>,
    /// Latest local selection not yet broadcast.
    pending: Option<Selection>,
    /// End of the current throttle window.
    deadline: Option<Instant>,
    render_pending: bool,
}

impl<E, S, C> Worker<E, S, C>
where
    E: DocumentEngine,
    S: DecorationSurface,
    C: Clock,
{
    async fn run(
        mut self,
        mut inbound: broadcast::Receiver<EphemeralPayload>,
        mut selections: mpsc::UnboundedReceiver<Selection>,
        mut changes: watch::Receiver<u64>,
        mut stop: oneshot::Receiver<()>,
    ) {
        let period = self.config.sweep_interval();
        let mut sweep = time::interval_at(Instant::now() + period, period);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut inbound_open = true;
        let mut selections_open = true;
        let mut changes_open = true;

        loop {
            let deadline = self.deadline;

            tokio::select! {
                biased;

                // a dropped handle closes the channel, which also stops us
                _ = &mut stop => break,

                received = inbound.recv(), if inbound_open => match received {
                    Ok(payload) => self.on_inbound(&payload),
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!(
                            "Peer {} lagged behind, {skipped} cursor messages skipped",
                            self.peer.peer_id
                        );
                    }
                    Err(RecvError::Closed) => inbound_open = false,
                },

                selection = selections.recv(), if selections_open => match selection {
                    Some(selection) => self.on_local_selection(selection),
                    None => selections_open = false,
                },

                _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.flush();
                }

                changed = changes.changed(), if changes_open => match changed {
                    Ok(()) => self.render_pending = true,
                    Err(_) => changes_open = false,
                },

                _ = sweep.tick() => self.sweep(),

                // only reached once nothing above is ready
                _ = future::ready(()), if self.render_pending => self.render(),
            }
        }

        log::info!("Cursor sync stopped for peer {}", self.peer.peer_id);
    }

    fn on_inbound(&mut self, payload: &[u8]) {
        let Some(cursor) = message::parse_bytes_at(payload, self.clock.now_ms()) else {
            log::debug!("Dropping malformed ephemeral payload ({} bytes)", payload.len());
            return;
        };

        if cursor.peer_id == self.peer.peer_id {
            log::trace!("Ignoring own cursor echo");
            return;
        }

        match self.registry.upsert(cursor) {
            UpsertOutcome::RejectedOutOfOrder => {
                log::debug!("Dropping out-of-order cursor message");
            }
            UpsertOutcome::Inserted | UpsertOutcome::Replaced => {
                self.publish_snapshot();
                self.render_pending = true;
            }
        }
    }

    fn on_local_selection(&mut self, selection: Selection) {
        self.pending = Some(selection);
        if self.deadline.is_none() {
            self.deadline = Some(Instant::now() + self.config.throttle_interval());
        }
    }

    fn flush(&mut self) {
        self.deadline = None;
        let Some(selection) = self.pending.take() else {
            return;
        };

        let options = MessageOptions {
            color: self.peer.color.clone(),
            ..MessageOptions::default()
        };
        let message = build_message_at(
            self.peer.peer_id.clone(),
            self.peer.name.clone(),
            self.peer.cursor_type,
            selection.head,
            selection.anchor,
            options,
            self.clock.now_ms(),
        );

        match message.encode() {
            Ok(bytes) => {
                if let Err(e) = self.engine.broadcast_ephemeral(bytes) {
                    log::warn!("Failed to broadcast cursor: {e}");
                }
            }
            Err(e) => log::warn!("Failed to encode cursor: {e}"),
        }
    }

    fn sweep(&mut self) {
        let removed = self
            .registry
            .sweep_stale(self.clock.now_ms(), self.config.stale_timeout_ms);
        if removed.is_empty() {
            return;
        }

        log::debug!("Evicted {} stale cursor(s): {:?}", removed.len(), removed);
        self.publish_snapshot();
        self.render_pending = true;
    }

    fn render(&mut self) {
        self.render_pending = false;
        let text = self.engine.current_text();
        let decorations = reconcile(&text, self.registry.values());
        if let Err(e) = self.surface.render(decorations) {
            log::error!("Rendering remote cursors failed: {e}");
        }
    }

    fn publish_snapshot(&self) {
        self.remote.send_replace(Arc::new(self.registry.snapshot()));
    }
}
