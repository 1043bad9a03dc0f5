//! Integration tests for the cursor sync driver.
//!
//! Every session runs on a shared in-process document with tokio's clock
//! paused, so throttle windows and sweeps are deterministic. Message
//! timestamps come from a `ManualClock` shared by the test and the session.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ephemera_collab::message::{build_message_at, parse_bytes_at};
use ephemera_collab::{
    CursorSync, CursorType, DecorationSet, DecorationSurface, LocalPeer, ManualClock,
    MemorySurface, MessageOptions, RenderError, SyncConfig, SyncError,
};
use ephemera_core::DocHandle;
use tokio::time::{sleep, Duration};

const T0: u64 = 1_000;

fn start(doc: &DocHandle, peer_id: &str, clock: &ManualClock) -> (CursorSync, MemorySurface) {
    start_with(doc, peer_id, clock, SyncConfig::default())
}

fn start_with(
    doc: &DocHandle,
    peer_id: &str,
    clock: &ManualClock,
    config: SyncConfig,
) -> (CursorSync, MemorySurface) {
    let surface = MemorySurface::new();
    let sync = CursorSync::spawn_with_clock(
        doc.clone(),
        surface.clone(),
        LocalPeer::with_id(peer_id, peer_id.to_uppercase()),
        config,
        clock.clone(),
    );
    (sync, surface)
}

/// Publish a cursor from a peer that has no session of its own.
fn send_cursor(
    doc: &DocHandle,
    peer_id: &str,
    cursor_type: CursorType,
    position: usize,
    anchor: Option<usize>,
    timestamp: u64,
) {
    let message = build_message_at(
        peer_id,
        peer_id.to_uppercase(),
        cursor_type,
        position,
        anchor,
        MessageOptions::default(),
        timestamp,
    );
    doc.hub().publish(message.encode().unwrap());
}

async fn settle() {
    sleep(Duration::from_millis(10)).await;
}

/// Surface that fails its first render, then succeeds.
#[derive(Clone, Default)]
struct FlakySurface {
    calls: Arc<AtomicUsize>,
}

impl DecorationSurface for FlakySurface {
    fn render(&mut self, _decorations: DecorationSet) -> Result<(), RenderError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(RenderError::new("surface detached"));
        }
        Ok(())
    }
}

// ─── Inbound ─────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_remote_caret_is_rendered() {
    let doc = DocHandle::with_content("hello world");
    let clock = ManualClock::new(T0);
    let (mut sync, surface) = start(&doc, "me", &clock);

    send_cursor(&doc, "alice", CursorType::User, 6, Some(11), T0);
    settle().await;

    let decorations = surface.current();
    assert_eq!(decorations.caret("alice").unwrap().position, 6);
    let selection = decorations.selection("alice").unwrap();
    assert_eq!((selection.from, selection.to), (6, 11));
    assert_eq!(sync.remote_cursors().len(), 1);

    sync.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn test_two_sessions_see_each_other() {
    let doc = DocHandle::with_content("shared document");
    let clock = ManualClock::new(T0);
    let (mut alice, alice_view) = start(&doc, "alice", &clock);
    let (mut bob, bob_view) = start(&doc, "bob", &clock);

    alice.selection_changed(3, None).unwrap();
    bob.selection_changed(7, Some(0)).unwrap();
    sleep(Duration::from_millis(200)).await;

    let seen_by_bob = bob_view.current();
    assert_eq!(seen_by_bob.caret("alice").unwrap().position, 3);
    assert!(seen_by_bob.caret("bob").is_none());

    let seen_by_alice = alice_view.current();
    let selection = seen_by_alice.selection("bob").unwrap();
    assert_eq!((selection.from, selection.to), (0, 7));
    assert!(seen_by_alice.caret("alice").is_none());

    alice.teardown().await;
    bob.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn test_self_echo_is_ignored() {
    let doc = DocHandle::with_content("text");
    let clock = ManualClock::new(T0);
    let (mut sync, surface) = start(&doc, "me", &clock);

    // our own throttled broadcast comes back through the hub
    sync.selection_changed(2, None).unwrap();
    sleep(Duration::from_millis(200)).await;
    send_cursor(&doc, "me", CursorType::User, 1, None, T0);
    settle().await;

    assert!(sync.remote_cursors().is_empty());
    assert_eq!(surface.render_count(), 0);

    sync.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn test_malformed_payloads_are_ignored() {
    let doc = DocHandle::with_content("text");
    let clock = ManualClock::new(T0);
    let (mut sync, surface) = start(&doc, "me", &clock);

    doc.hub().publish(b"not json".to_vec());
    doc.hub().publish(br#"{"peerId":"x","position":1}"#.to_vec());
    doc.hub().publish(br#"{"type":"selection","peerId":"x","position":1}"#.to_vec());
    doc.hub().publish(br#"{"type":"cursor","position":1}"#.to_vec());
    doc.hub().publish(br#"{"type":"cursor","peerId":"x"}"#.to_vec());
    settle().await;

    assert!(sync.remote_cursors().is_empty());
    assert_eq!(surface.render_count(), 0);
    assert!(sync.is_running());

    // the session keeps working afterwards
    doc.hub().publish(br#"{"type":"cursor","peerId":"x","position":1}"#.to_vec());
    settle().await;
    assert_eq!(surface.render_count(), 1);
    assert_eq!(surface.current().caret("x").unwrap().style.label, "Anonymous");

    sync.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn test_burst_coalesces_into_one_render() {
    let doc = DocHandle::with_content("0123456789");
    let clock = ManualClock::new(T0);
    let (mut sync, surface) = start(&doc, "me", &clock);

    for (i, peer) in ["a", "b", "c", "d", "e"].into_iter().enumerate() {
        send_cursor(&doc, peer, CursorType::User, i, None, T0);
    }
    settle().await;

    assert_eq!(surface.render_count(), 1);
    assert_eq!(surface.current().carets.len(), 5);

    sync.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn test_same_peer_latest_message_wins() {
    let doc = DocHandle::with_content("0123456789");
    let clock = ManualClock::new(T0);
    let (mut sync, surface) = start(&doc, "me", &clock);

    send_cursor(&doc, "a", CursorType::User, 2, Some(6), T0);
    send_cursor(&doc, "a", CursorType::User, 9, None, T0);
    settle().await;

    let decorations = surface.current();
    assert_eq!(decorations.carets.len(), 1);
    assert_eq!(decorations.caret("a").unwrap().position, 9);
    assert!(decorations.selections.is_empty());

    sync.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn test_out_of_order_rejection_when_enabled() {
    let doc = DocHandle::with_content("0123456789");
    let clock = ManualClock::new(T0);
    let config = SyncConfig::from_json(r#"{"reject_out_of_order": true}"#).unwrap();
    let (mut sync, surface) = start_with(&doc, "me", &clock, config);

    send_cursor(&doc, "a", CursorType::User, 1, None, T0 + 500);
    send_cursor(&doc, "a", CursorType::User, 9, None, T0);
    settle().await;

    assert_eq!(surface.current().caret("a").unwrap().position, 1);

    sync.teardown().await;
}

// ─── Outbound throttle ───────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_rapid_changes_send_latest_once() {
    let doc = DocHandle::with_content("hello world");
    let mut listener = doc.hub().subscribe();
    let clock = ManualClock::new(T0);
    let (mut sync, _surface) = start(&doc, "me", &clock);

    sync.selection_changed(1, None).unwrap();
    sleep(Duration::from_millis(30)).await;
    sync.selection_changed(5, Some(2)).unwrap();
    sleep(Duration::from_millis(300)).await;

    let sent = parse_bytes_at(&listener.try_recv().unwrap(), 0).unwrap();
    assert_eq!(sent.peer_id, "me");
    assert_eq!(sent.position, 5);
    assert_eq!(sent.anchor, Some(2));
    assert_eq!(sent.timestamp, T0);
    assert!(listener.try_recv().is_err());

    sync.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn test_teardown_cancels_pending_send() {
    let doc = DocHandle::with_content("hello");
    let mut listener = doc.hub().subscribe();
    let clock = ManualClock::new(T0);
    let (mut sync, surface) = start(&doc, "me", &clock);

    sync.selection_changed(3, None).unwrap();
    send_cursor(&doc, "alice", CursorType::User, 1, None, T0);
    sync.teardown().await;
    // drain the remote message published above
    let _ = listener.try_recv();

    sleep(Duration::from_millis(500)).await;
    assert!(listener.try_recv().is_err());
    assert_eq!(surface.render_count(), 0);
    assert!(!sync.is_running());
    assert!(matches!(
        sync.selection_changed(4, None),
        Err(SyncError::Stopped)
    ));
}

// ─── Sweeps and document changes ─────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_stale_peer_swept_ai_peer_remains() {
    let doc = DocHandle::with_content("0123456789");
    let clock = ManualClock::new(T0);
    let (mut sync, surface) = start(&doc, "me", &clock);

    send_cursor(&doc, "A", CursorType::User, 4, None, T0);
    settle().await;
    assert_eq!(sync.remote_cursors().len(), 1);

    // A goes quiet; B (an agent) shows up right as A's window runs out
    clock.set(T0 + 10_500);
    send_cursor(&doc, "B", CursorType::Ai, 7, None, T0 + 10_500);
    settle().await;
    assert_eq!(sync.remote_cursors().len(), 2);

    sleep(Duration::from_millis(2_100)).await;

    let remaining = sync.remote_cursors();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].peer_id, "B");
    assert_eq!(remaining[0].cursor_type, CursorType::Ai);

    let decorations = surface.current();
    assert!(decorations.caret("A").is_none());
    assert_eq!(decorations.caret("B").unwrap().style.label, "🤖 B");

    sync.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn test_sweep_without_removal_does_not_render() {
    let doc = DocHandle::with_content("0123456789");
    let clock = ManualClock::new(T0);
    let (mut sync, surface) = start(&doc, "me", &clock);

    send_cursor(&doc, "a", CursorType::User, 4, None, T0);
    settle().await;
    assert_eq!(surface.render_count(), 1);

    sleep(Duration::from_millis(6_500)).await;
    assert_eq!(surface.render_count(), 1);

    sync.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn test_caret_follows_document_length() {
    let doc = DocHandle::with_content("0123456789");
    let clock = ManualClock::new(T0);
    let (mut sync, surface) = start(&doc, "me", &clock);

    send_cursor(&doc, "a", CursorType::User, 8, None, T0);
    settle().await;
    assert!(surface.current().caret("a").is_some());

    doc.text().delete(0, 5).unwrap();
    settle().await;
    assert!(surface.current().is_empty());

    doc.text().append("abcdef").unwrap();
    settle().await;
    assert_eq!(surface.current().caret("a").unwrap().position, 8);

    sync.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn test_render_failure_does_not_stop_session() {
    let doc = DocHandle::with_content("0123456789");
    let clock = ManualClock::new(T0);
    let surface = FlakySurface::default();
    let calls = surface.calls.clone();
    let mut sync = CursorSync::spawn_with_clock(
        doc.clone(),
        surface,
        LocalPeer::with_id("me", "Me"),
        SyncConfig::default(),
        clock.clone(),
    );

    send_cursor(&doc, "a", CursorType::User, 1, None, T0);
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(sync.is_running());

    send_cursor(&doc, "b", CursorType::User, 2, None, T0);
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(sync.remote_cursors().len(), 2);

    sync.teardown().await;
}
