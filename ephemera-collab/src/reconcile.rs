//! Position reconciliation: raw remote cursors → renderable decorations.
//!
//! Every pass recomputes all decorations from the raw cursor positions
//! against the current text. Nothing is carried over between passes, so a
//! cursor invalidated by a remote edit simply disappears until its peer
//! reports a corrected position.
//!
//! ```text
//!  text (chars) ──┐
//!                 ├─► bounds check ─► newline rule ─► caret
//!  cursors ───────┘         │
//!                           └──────► normalize + clamp ─► selection
//! ```

use crate::message::{Cursor, CursorType};

/// Selection fill opacity for human cursors.
pub const HUMAN_SELECTION_OPACITY: f32 = 0.25;
/// AI selections are drawn fainter than human ones.
pub const AI_SELECTION_OPACITY: f32 = 0.12;

/// Rendering hints attached to every decoration of one cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct DecorationStyle {
    pub color: String,
    pub label: String,
    pub cursor_type: CursorType,
    pub fill_opacity: f32,
}

impl DecorationStyle {
    pub fn for_cursor(cursor: &Cursor) -> Self {
        Self {
            color: cursor.color.clone(),
            label: cursor.display_label(),
            cursor_type: cursor.cursor_type,
            fill_opacity: if cursor.cursor_type.is_ai() {
                AI_SELECTION_OPACITY
            } else {
                HUMAN_SELECTION_OPACITY
            },
        }
    }
}

/// Zero-width marker at a character offset.
#[derive(Debug, Clone, PartialEq)]
pub struct CaretDecoration {
    pub peer_id: String,
    pub position: usize,
    pub style: DecorationStyle,
}

/// Highlighted range `[from, to)` with `from < to`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionDecoration {
    pub peer_id: String,
    pub from: usize,
    pub to: usize,
    pub style: DecorationStyle,
}

/// Complete set of remote decorations for one render pass.
///
/// A surface replaces its previous set with this one atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecorationSet {
    pub carets: Vec<CaretDecoration>,
    pub selections: Vec<SelectionDecoration>,
}

impl DecorationSet {
    pub fn is_empty(&self) -> bool {
        self.carets.is_empty() && self.selections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.carets.len() + self.selections.len()
    }

    pub fn caret(&self, peer_id: &str) -> Option<&CaretDecoration> {
        self.carets.iter().find(|c| c.peer_id == peer_id)
    }

    pub fn selection(&self, peer_id: &str) -> Option<&SelectionDecoration> {
        self.selections.iter().find(|s| s.peer_id == peer_id)
    }
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r')
}

/// Compute the decorations for `cursors` over `text`.
pub fn reconcile<'a>(text: &str, cursors: impl IntoIterator<Item = &'a Cursor>) -> DecorationSet {
    let chars: Vec<char> = text.chars().collect();
    let length = chars.len();
    let mut set = DecorationSet::default();

    for cursor in cursors {
        if cursor.position > length {
            log::trace!(
                "cursor of {} at {} is past the end ({}), skipping",
                cursor.peer_id,
                cursor.position,
                length
            );
            continue;
        }

        let style = DecorationStyle::for_cursor(cursor);

        if let Some((from, to)) = cursor.selection() {
            let (from, to) = (from.min(length), to.min(length));
            if from < to {
                set.selections.push(SelectionDecoration {
                    peer_id: cursor.peer_id.clone(),
                    from,
                    to,
                    style: style.clone(),
                });
            }
        }

        // a caret right before a line break is ambiguous at wrap boundaries
        if chars.get(cursor.position).is_some_and(|&c| is_line_terminator(c)) {
            continue;
        }

        set.carets.push(CaretDecoration {
            peer_id: cursor.peer_id.clone(),
            position: cursor.position,
            style,
        });
    }

    set
}
