//! Per-session handle on a shared document.

use std::sync::Arc;

use crate::hub::EphemeralHub;
use crate::text::SharedText;

/// A session's view of one collaborative document: the durable text and the
/// ephemeral channel attached to it.
///
/// Cloning yields another session on the same document.
#[derive(Debug, Clone, Default)]
pub struct DocHandle {
    text: Arc<SharedText>,
    hub: Arc<EphemeralHub>,
}

impl DocHandle {
    pub fn new(text: SharedText, hub: EphemeralHub) -> Self {
        Self {
            text: Arc::new(text),
            hub: Arc::new(hub),
        }
    }

    pub fn with_content(content: &str) -> Self {
        Self::new(SharedText::with_content(content), EphemeralHub::default())
    }

    pub fn text(&self) -> &SharedText {
        &self.text
    }

    pub fn hub(&self) -> &EphemeralHub {
        &self.hub
    }
}
