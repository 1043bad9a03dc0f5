//! Cursor message model: wire schema, parsing and display rules.
//!
//! Wire format (JSON, camelCase):
//! ```text
//! {
//!   "type": "cursor",            ← discriminator, anything else is ignored
//!   "peerId": "…",               ← required, non-empty
//!   "name": "Alice",             ← default "Anonymous"
//!   "cursorType": "user",        ← user | ai | streaming_edit, default user
//!   "position": 42,              ← required, character offset
//!   "anchor": 37,                ← optional, other end of the selection
//!   "color": "#3B82F6",          ← default derived from peerId / cursorType
//!   "partialPattern": "fo+",     ← streaming_edit only
//!   "operationType": "replace",  ← informational
//!   "timestamp": 1700000000000   ← epoch ms, default now
//! }
//! ```
//!
//! Parsing never fails loudly: anything malformed yields `None` and is
//! dropped by the caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clock::{Clock, SystemClock};

/// Display name used when a message carries none.
pub const FALLBACK_NAME: &str = "Anonymous";

/// Human cursor palette. Reserved AI colors below never appear here.
pub const PALETTE: [&str; 10] = [
    "#EF4444", // red
    "#F97316", // orange
    "#EAB308", // yellow
    "#22C55E", // green
    "#14B8A6", // teal
    "#06B6D4", // cyan
    "#3B82F6", // blue
    "#6366F1", // indigo
    "#EC4899", // pink
    "#84CC16", // lime
];

pub const AI_COLOR: &str = "#9333EA";
pub const STREAMING_EDIT_COLOR: &str = "#F59E0B";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorType {
    #[default]
    User,
    Ai,
    StreamingEdit,
}

impl CursorType {
    /// Whether the cursor belongs to an AI agent rather than a human.
    pub fn is_ai(self) -> bool {
        matches!(self, Self::Ai | Self::StreamingEdit)
    }
}

/// Kind of AI operation in progress. Carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationType {
    Insert,
    Delete,
    Replace,
    Other(String),
}

impl From<String> for OperationType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "insert" => Self::Insert,
            "delete" => Self::Delete,
            "replace" => Self::Replace,
            _ => Self::Other(value),
        }
    }
}

impl From<OperationType> for String {
    fn from(value: OperationType) -> Self {
        match value {
            OperationType::Insert => "insert".into(),
            OperationType::Delete => "delete".into(),
            OperationType::Replace => "replace".into(),
            OperationType::Other(other) => other,
        }
    }
}

/// Last known cursor state of one peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
    pub peer_id: String,
    pub name: String,
    pub cursor_type: CursorType,
    pub position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<usize>,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<OperationType>,
    pub timestamp: u64,
}

impl Cursor {
    /// Normalized `(from, to)` of the selection, if there is a non-empty one.
    pub fn selection(&self) -> Option<(usize, usize)> {
        match self.anchor {
            Some(anchor) if anchor != self.position => {
                Some((anchor.min(self.position), anchor.max(self.position)))
            }
            _ => None,
        }
    }

    /// Label shown next to the cursor.
    pub fn display_label(&self) -> String {
        display_label(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Cursor,
}

/// A cursor update as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(flatten)]
    pub cursor: Cursor,
}

impl CursorMessage {
    pub fn new(cursor: Cursor) -> Self {
        Self {
            kind: MessageKind::Cursor,
            cursor,
        }
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Serialize to JSON bytes for an ephemeral broadcast.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn into_cursor(self) -> Cursor {
        self.cursor
    }
}

/// Optional fields of an outbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageOptions {
    pub color: Option<String>,
    pub partial_pattern: Option<String>,
    pub operation_type: Option<OperationType>,
}

/// Inbound shape before validation: every field optional so that
/// presence can be checked explicitly.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCursor {
    peer_id: Option<String>,
    name: Option<String>,
    cursor_type: Option<CursorType>,
    position: Option<u64>,
    anchor: Option<u64>,
    color: Option<String>,
    partial_pattern: Option<String>,
    operation_type: Option<OperationType>,
    timestamp: Option<u64>,
}

/// Parse an inbound payload, stamping missing timestamps with the wall clock.
pub fn parse(payload: &Value) -> Option<Cursor> {
    parse_at(payload, SystemClock.now_ms())
}

/// Parse an inbound payload; `now_ms` is used when it carries no timestamp.
pub fn parse_at(payload: &Value, now_ms: u64) -> Option<Cursor> {
    // check the discriminator first so foreign payloads are skipped cheaply
    if payload.get("type").and_then(Value::as_str) != Some("cursor") {
        return None;
    }

    let raw = RawCursor::deserialize(payload).ok()?;

    let peer_id = raw.peer_id.filter(|id| !id.is_empty())?;
    let position = usize::try_from(raw.position?).ok()?;
    let anchor = match raw.anchor {
        Some(anchor) => Some(usize::try_from(anchor).ok()?),
        None => None,
    };
    let cursor_type = raw.cursor_type.unwrap_or_default();
    let color = raw
        .color
        .unwrap_or_else(|| default_color(&peer_id, cursor_type));

    Some(Cursor {
        name: raw.name.unwrap_or_else(|| FALLBACK_NAME.to_string()),
        cursor_type,
        position,
        anchor,
        color,
        partial_pattern: raw.partial_pattern,
        operation_type: raw.operation_type,
        timestamp: raw.timestamp.unwrap_or(now_ms),
        peer_id,
    })
}

/// Parse raw ephemeral bytes (JSON).
pub fn parse_bytes(bytes: &[u8]) -> Option<Cursor> {
    parse_bytes_at(bytes, SystemClock.now_ms())
}

pub fn parse_bytes_at(bytes: &[u8], now_ms: u64) -> Option<Cursor> {
    let value: Value = serde_json::from_slice(bytes).ok()?;
    parse_at(&value, now_ms)
}

/// Stable palette color for a peer, identical across sessions.
///
/// Classic 32-bit string hash (`h = c + (h << 5) - h`) over UTF-16 code
/// units, absolute value modulo the palette size.
pub fn deterministic_color(peer_id: &str) -> &'static str {
    let hash = peer_id.encode_utf16().fold(0i32, |hash, unit| {
        i32::from(unit).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    });
    PALETTE[hash.unsigned_abs() as usize % PALETTE.len()]
}

/// Reserved color for AI cursors, `None` for humans.
pub fn fixed_color(cursor_type: CursorType) -> Option<&'static str> {
    match cursor_type {
        CursorType::User => None,
        CursorType::Ai => Some(AI_COLOR),
        CursorType::StreamingEdit => Some(STREAMING_EDIT_COLOR),
    }
}

/// Color used when a message does not carry one.
pub fn default_color(peer_id: &str, cursor_type: CursorType) -> String {
    fixed_color(cursor_type)
        .unwrap_or_else(|| deterministic_color(peer_id))
        .to_string()
}

/// Label rendered next to a remote cursor.
pub fn display_label(cursor: &Cursor) -> String {
    match cursor.cursor_type {
        CursorType::User => cursor.name.clone(),
        CursorType::Ai => format!("🤖 {}", cursor.name),
        CursorType::StreamingEdit => match &cursor.partial_pattern {
            Some(pattern) => format!("✍️ {}: {}", cursor.name, pattern),
            None => format!("✍️ {}", cursor.name),
        },
    }
}

/// Build an outbound message stamped with the wall clock.
pub fn build_message(
    peer_id: impl Into<String>,
    name: impl Into<String>,
    cursor_type: CursorType,
    position: usize,
    anchor: Option<usize>,
    options: MessageOptions,
) -> CursorMessage {
    build_message_at(
        peer_id,
        name,
        cursor_type,
        position,
        anchor,
        options,
        SystemClock.now_ms(),
    )
}

pub fn build_message_at(
    peer_id: impl Into<String>,
    name: impl Into<String>,
    cursor_type: CursorType,
    position: usize,
    anchor: Option<usize>,
    options: MessageOptions,
    now_ms: u64,
) -> CursorMessage {
    let peer_id = peer_id.into();
    let color = options
        .color
        .unwrap_or_else(|| default_color(&peer_id, cursor_type));

    CursorMessage::new(Cursor {
        name: name.into(),
        cursor_type,
        position,
        anchor,
        color,
        partial_pattern: options.partial_pattern,
        operation_type: options.operation_type,
        timestamp: now_ms,
        peer_id,
    })
}
