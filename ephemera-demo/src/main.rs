//! Ephemera demo — two people and an AI agent in one document.
//!
//! Runs everything in-process: two human sessions render each other's
//! cursors into memory surfaces while an agent rewrites a sentence and
//! streams its progress. Decorations are printed after every step.
//!
//! Usage: `ephemera-demo [config.json]` (set `RUST_LOG=debug` for details).

use std::time::Duration;

use ephemera_collab::{
    AgentEditor, CursorSync, DecorationSet, LocalPeer, MemorySurface, OperationType, SyncConfig,
};
use ephemera_core::DocHandle;
use log::info;

const DOCUMENT: &str = "Ephemera shows who is editing what.\nCursors are never stored.\n";

fn load_config() -> Result<SyncConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)?;
            info!("Loaded sync config from {path}");
            Ok(SyncConfig::from_json(&json)?)
        }
        // short windows so the demo finishes in a few seconds
        None => Ok(SyncConfig {
            stale_timeout_ms: 1_500,
            sweep_interval_ms: 500,
            ..SyncConfig::default()
        }),
    }
}

fn print_view(owner: &str, decorations: &DecorationSet) {
    println!("  {owner} sees:");
    if decorations.is_empty() {
        println!("    (nobody)");
    }
    for caret in &decorations.carets {
        println!(
            "    caret {:<14} at {:>3}  {}",
            caret.style.label, caret.position, caret.style.color
        );
    }
    for selection in &decorations.selections {
        println!(
            "    range {:<14} {:>3}..{:<3} {} (opacity {:.2})",
            selection.style.label,
            selection.from,
            selection.to,
            selection.style.color,
            selection.style.fill_opacity
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = load_config()?;
    let settle = config.throttle_interval() * 2;
    let doc = DocHandle::with_content(DOCUMENT);

    let alice_view = MemorySurface::new();
    let bob_view = MemorySurface::new();
    let mut alice = CursorSync::spawn(
        doc.clone(),
        alice_view.clone(),
        LocalPeer::new("Alice"),
        config.clone(),
    );
    let mut bob = CursorSync::spawn(
        doc.clone(),
        bob_view.clone(),
        LocalPeer::new("Bob"),
        config.clone(),
    );
    let agent = AgentEditor::new(doc.clone(), "Claude");

    info!("Session started: alice={} bob={}", alice.peer_id(), bob.peer_id());

    println!("1. Alice places her caret, Bob selects a word");
    alice.selection_changed(0, None)?;
    bob.selection_changed(14, Some(9))?;
    tokio::time::sleep(settle).await;
    print_view("Alice", &alice_view.current());
    print_view("Bob", &bob_view.current());

    println!("2. The agent streams a pending edit");
    agent.report_streaming(54, "sto", OperationType::Replace)?;
    tokio::time::sleep(settle).await;
    print_view("Alice", &alice_view.current());

    println!("3. The agent commits the edit");
    agent.rewrite("Ephemera shows who is editing what.\nCursors are never persisted.\n")?;
    tokio::time::sleep(settle).await;
    print_view("Bob", &bob_view.current());
    println!("  document: {:?}", doc.text().text());

    println!("4. Bob leaves and the agent goes quiet");
    bob.teardown().await;
    let stale_after = Duration::from_millis(config.stale_timeout_ms) + config.sweep_interval() * 2;
    info!("Waiting {stale_after:?} for Bob's cursor to expire");
    tokio::time::sleep(stale_after).await;
    print_view("Alice", &alice_view.current());

    alice.teardown().await;
    let stats = doc.hub().stats();
    info!(
        "Done: {} ephemeral messages sent, {} dropped",
        stats.messages_sent, stats.messages_dropped
    );
    Ok(())
}
