//! Editing surface seam: where decorations end up.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::RenderError;
use crate::reconcile::DecorationSet;

/// A decoration sink owned by one sync session.
///
/// Each call replaces the previously rendered set as a whole. Local text
/// edits between passes are the surface's own business; the sync driver
/// always hands over positions computed against the current text.
pub trait DecorationSurface: Send + 'static {
    fn render(&mut self, decorations: DecorationSet) -> Result<(), RenderError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    current: DecorationSet,
    render_count: usize,
}

/// Surface that keeps the last rendered set in memory.
///
/// Clones observe the same state, so a test or a headless host can hand one
/// clone to the driver and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // a panic while holding the lock cannot leave the state half-written
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current(&self) -> DecorationSet {
        self.lock().current.clone()
    }

    pub fn render_count(&self) -> usize {
        self.lock().render_count
    }
}

impl DecorationSurface for MemorySurface {
    fn render(&mut self, decorations: DecorationSet) -> Result<(), RenderError> {
        let mut state = self.lock();
        state.current = decorations;
        state.render_count += 1;
        Ok(())
    }
}
