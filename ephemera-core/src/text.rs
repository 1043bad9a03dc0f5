//! Collaborative text backed by a yrs document.
//!
//! All public offsets are **character** offsets. yrs indexes text by UTF-8
//! bytes by default, so every mutation converts at the boundary.
//!
//! Every committed mutation (local or replicated) bumps a revision counter
//! published through a `watch` channel, which is how cursor reconciliation
//! learns that positions may have shifted.

use tokio::sync::watch;
use yrs::updates::decoder::Decode;
use yrs::{Doc, GetString, ReadTxn, StateVector, Text, TextRef, Transact, Update};

use crate::error::{CoreError, CoreResult};

/// Name of the text root inside the yrs document.
pub const TEXT_ROOT: &str = "text";

pub struct SharedText {
    doc: Doc,
    text: TextRef,
    revision: watch::Sender<u64>,
}

impl std::fmt::Debug for SharedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedText")
            .field("len", &self.len())
            .field("revision", &*self.revision.borrow())
            .finish()
    }
}

impl Default for SharedText {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedText {
    pub fn new() -> Self {
        let doc = Doc::new();
        let text = doc.get_or_insert_text(TEXT_ROOT);
        let (revision, _) = watch::channel(0);
        Self {
            doc,
            text,
            revision,
        }
    }

    /// Create a text pre-filled with `content`.
    pub fn with_content(content: &str) -> Self {
        let shared = Self::new();
        if !content.is_empty() {
            let mut txn = shared.doc.transact_mut();
            shared.text.insert(&mut txn, 0, content);
        }
        shared
    }

    /// Current text content.
    pub fn text(&self) -> String {
        let txn = self.doc.transact();
        self.text.get_string(&txn)
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.text().chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current revision (number of committed mutations).
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Subscribe to revision bumps.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Delete `delete` characters at `position`, then insert `insert` there.
    pub fn splice(&self, position: usize, delete: usize, insert: &str) -> CoreResult<()> {
        if delete == 0 && insert.is_empty() {
            return Ok(());
        }

        {
            let mut txn = self.doc.transact_mut();
            let current = self.text.get_string(&txn);
            let length = current.chars().count();
            if position > length || delete > length - position {
                return Err(CoreError::OutOfBounds {
                    position,
                    delete,
                    length,
                });
            }

            let start = byte_offset(&current, position);
            if delete > 0 {
                let end = byte_offset(&current, position + delete);
                self.text
                    .remove_range(&mut txn, start as u32, (end - start) as u32);
            }
            if !insert.is_empty() {
                self.text.insert(&mut txn, start as u32, insert);
            }
        }

        self.bump();
        Ok(())
    }

    pub fn insert(&self, position: usize, text: &str) -> CoreResult<()> {
        self.splice(position, 0, text)
    }

    pub fn delete(&self, position: usize, length: usize) -> CoreResult<()> {
        self.splice(position, length, "")
    }

    pub fn append(&self, text: &str) -> CoreResult<()> {
        self.splice(self.len(), 0, text)
    }

    /// Encode the full document state as a v1 update.
    pub fn state_update(&self) -> Vec<u8> {
        let txn = self.doc.transact();
        txn.encode_state_as_update_v1(&StateVector::default())
    }

    /// Merge a v1 update produced by another replica.
    pub fn apply_update(&self, update: &[u8]) -> CoreResult<()> {
        let update = Update::decode_v1(update).map_err(|e| CoreError::Decode(e.to_string()))?;
        {
            let mut txn = self.doc.transact_mut();
            txn.apply_update(update)
                .map_err(|e| CoreError::Update(e.to_string()))?;
        }
        self.bump();
        Ok(())
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }
}

/// Byte offset of the `index`-th character, or the string length past the end.
fn byte_offset(s: &str, index: usize) -> usize {
    s.char_indices()
        .nth(index)
        .map(|(offset, _)| offset)
        .unwrap_or(s.len())
}
