//! # ephemera-collab — remote cursor presence for shared documents
//!
//! Shows where every other participant (human or AI agent) is working in a
//! shared document. Cursor state travels as ephemeral JSON messages next to
//! the durable document history and is never persisted.
//!
//! ## Architecture
//!
//! ```text
//! local selection ─► CursorSync ── throttled ──► ephemeral hub ──┐
//!                        ▲                                       │
//!                        └────── inbound (parse, drop echo) ◄────┘
//!                        │
//!                        ▼
//!               PeerCursorRegistry ──► reconcile(text) ──► DecorationSurface
//! ```
//!
//! ## Modules
//!
//! - [`message`] — wire schema, parsing, colors and labels
//! - [`registry`] — last known cursor per remote peer, staleness sweep
//! - [`reconcile`] — cursors + text → caret/selection decorations
//! - [`driver`] — the per-session task tying everything together
//! - [`agent`] — cursor reporting for AI editors
//! - [`engine`] / [`surface`] — seams to the document and the editor view

pub mod agent;
pub mod clock;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod message;
pub mod peer;
pub mod reconcile;
pub mod registry;
pub mod surface;

pub use agent::AgentEditor;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SyncConfig;
pub use driver::{CursorSync, RemoteCursors, Selection};
pub use engine::DocumentEngine;
pub use error::{RenderError, SyncError, SyncResult};
pub use message::{
    build_message, deterministic_color, display_label, fixed_color, parse, Cursor,
    CursorMessage, CursorType, MessageOptions, OperationType,
};
pub use peer::LocalPeer;
pub use reconcile::{reconcile, CaretDecoration, DecorationSet, DecorationStyle, SelectionDecoration};
pub use registry::{PeerCursorRegistry, UpsertOutcome, DEFAULT_STALE_TIMEOUT_MS};
pub use surface::{DecorationSurface, MemorySurface};
