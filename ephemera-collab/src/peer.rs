//! Identity of the local session.

use uuid::Uuid;

use crate::message::CursorType;

/// Who the local session broadcasts as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPeer {
    pub peer_id: String,
    pub name: String,
    pub cursor_type: CursorType,
    /// Overrides the derived color when set.
    pub color: Option<String>,
}

impl LocalPeer {
    /// A human peer with a fresh random id.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), name)
    }

    pub fn with_id(peer_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            peer_id: peer_id.into(),
            name: name.into(),
            cursor_type: CursorType::User,
            color: None,
        }
    }

    pub fn with_cursor_type(mut self, cursor_type: CursorType) -> Self {
        self.cursor_type = cursor_type;
        self
    }

    pub fn as_ai(self) -> Self {
        self.with_cursor_type(CursorType::Ai)
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}
