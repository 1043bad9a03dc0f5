//! Minimal single-splice diff.
//!
//! Agents that rewrite a whole text (e.g. an LLM suggestion) should still
//! touch the shared document with the smallest possible change, so that
//! concurrent edits elsewhere in the text survive the merge and the edit
//! position can be reported as a cursor.

/// One contiguous replacement, in character offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub position: usize,
    pub delete: usize,
    pub insert: String,
}

impl Splice {
    /// Character offset right after the inserted text.
    pub fn end(&self) -> usize {
        self.position + self.insert.chars().count()
    }
}

/// Compute the splice turning `old` into `new`.
///
/// Strips the longest common prefix, then the longest common suffix of what
/// remains. Returns `None` when the texts are identical.
pub fn compute_splice(old: &str, new: &str) -> Option<Splice> {
    if old == new {
        return None;
    }

    let old: Vec<char> = old.chars().collect();
    let new: Vec<char> = new.chars().collect();

    let prefix = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let old_rest = &old[prefix..];
    let new_rest = &new[prefix..];
    let suffix = old_rest
        .iter()
        .rev()
        .zip(new_rest.iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    Some(Splice {
        position: prefix,
        delete: old_rest.len() - suffix,
        insert: new_rest[..new_rest.len() - suffix].iter().collect(),
    })
}
