//! # ephemera-core — shared document side of Ephemera
//!
//! Everything a collaborative session needs from the document engine,
//! independent of how cursors are tracked or rendered.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   splice / append    ┌──────────────┐
//! │ local edits  │ ───────────────────► │ SharedText   │ ── revision (watch)
//! └──────────────┘                      │ (yrs Doc)    │
//!                                       └──────────────┘
//! ┌──────────────┐   publish (bytes)    ┌──────────────┐
//! │ peer session │ ◄──────────────────► │ EphemeralHub │ ── fan-out to all
//! └──────────────┘                      │ (broadcast)  │    subscribers
//!                                       └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`text`] — yrs-backed collaborative text with character offsets
//! - [`splice`] — minimal single-splice diff between two texts
//! - [`hub`] — in-process ephemeral message fan-out
//! - [`handle`] — per-session bundle of text + hub

pub mod error;
pub mod handle;
pub mod hub;
pub mod splice;
pub mod text;

pub use error::{CoreError, CoreResult};
pub use handle::DocHandle;
pub use hub::{EphemeralHub, EphemeralPayload, HubStats};
pub use splice::{compute_splice, Splice};
pub use text::SharedText;
