//! Text edits.
//!
//! An [`Edit`] describes one contiguous replacement: bytes
//! `start_byte..old_end_byte` of the old text became
//! `start_byte..new_end_byte` of the new text.

use serde::{Deserialize, Serialize};
use synth_ast::{Position, SourceMap};

use crate::ParseError;

/// One contiguous replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edit {
    pub start_byte: u32,
    pub old_end_byte: u32,
    pub new_end_byte: u32,
    /// Resolved against the old text.
    pub start_position: Position,
    /// Resolved against the old text.
    pub old_end_position: Position,
    /// Resolved against the new text.
    pub new_end_position: Position,
}

impl Edit {
    /// Creates an edit from byte offsets. Positions are filled in by
    /// [`Edit::canonicalize`].
    pub fn new(start_byte: u32, old_end_byte: u32, new_end_byte: u32) -> Self {
        Self {
            start_byte,
            old_end_byte,
            new_end_byte,
            ..Self::default()
        }
    }

    /// Insertion of `len` bytes at `at`. Offsets saturate at `u32::MAX`.
    pub fn insert(at: u32, len: u32) -> Self {
        Self::new(at, at, at.saturating_add(len))
    }

    /// Deletion of `start..end`.
    pub fn delete(start: u32, end: u32) -> Self {
        Self::new(start, end, start)
    }

    /// Replacement of `start..old_end` by `new_len` bytes. Offsets saturate
    /// at `u32::MAX`.
    pub fn replace(start: u32, old_end: u32, new_len: u32) -> Self {
        Self::new(start, old_end, start.saturating_add(new_len))
    }

    /// Change in document length.
    #[inline]
    pub fn delta(&self) -> i64 {
        i64::from(self.new_end_byte) - i64::from(self.old_end_byte)
    }

    /// Maps an old offset at or past `old_end_byte` into the new text.
    #[inline]
    pub fn shift(&self, offset: u32) -> u32 {
        (i64::from(offset) + self.delta()).max(0) as u32
    }

    /// Returns true if the edit changes nothing.
    pub fn is_empty(&self) -> bool {
        self.start_byte == self.old_end_byte && self.start_byte == self.new_end_byte
    }

    /// Number of bytes inserted; 0 when `new_end_byte` precedes the start.
    pub fn inserted_len(&self) -> u32 {
        self.new_end_byte.saturating_sub(self.start_byte)
    }

    /// Checks the offsets against both texts and fills in line/column
    /// positions: start and old end from `old`, new end from `new`.
    pub fn canonicalize(&self, old: &str, new: &str) -> Result<Edit, ParseError> {
        let (start, old_end, new_end) = (
            self.start_byte as usize,
            self.old_end_byte as usize,
            self.new_end_byte as usize,
        );
        if start > old_end || old_end > old.len() {
            return Err(ParseError::invalid_edit(format!(
                "range {start}..{old_end} is outside the old text ({} bytes)",
                old.len()
            )));
        }
        if start > new_end || new_end > new.len() {
            return Err(ParseError::invalid_edit(format!(
                "range {start}..{new_end} is outside the new text ({} bytes)",
                new.len()
            )));
        }
        if old.len() as i64 + self.delta() != new.len() as i64 {
            return Err(ParseError::invalid_edit(format!(
                "length change {} does not match texts of {} and {} bytes",
                self.delta(),
                old.len(),
                new.len()
            )));
        }
        if !old.is_char_boundary(start)
            || !old.is_char_boundary(old_end)
            || !new.is_char_boundary(new_end)
        {
            return Err(ParseError::invalid_edit("offsets split a character"));
        }
        let (a, b) = (old.as_bytes(), new.as_bytes());
        if a[..start] != b[..start] || a[old_end..] != b[new_end..] {
            return Err(ParseError::invalid_edit(format!(
                "text outside {start}..{old_end} differs between the old and new text"
            )));
        }

        let old_map = SourceMap::new(old);
        let new_map = SourceMap::new(new);
        Ok(Edit {
            start_position: old_map.position(self.start_byte),
            old_end_position: old_map.position(self.old_end_byte),
            new_end_position: new_map.position(self.new_end_byte),
            ..*self
        })
    }

    /// Detects the edit between two texts from their common prefix and
    /// suffix. Texts that share neither yield a full-range edit.
    pub fn diff(old: &str, new: &str) -> Edit {
        let (a, b) = (old.as_bytes(), new.as_bytes());
        let mut prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
        while !old.is_char_boundary(prefix) || !new.is_char_boundary(prefix) {
            prefix -= 1;
        }

        let limit = a.len().min(b.len()) - prefix;
        let mut suffix = a
            .iter()
            .rev()
            .zip(b.iter().rev())
            .take(limit)
            .take_while(|(x, y)| x == y)
            .count();
        while !old.is_char_boundary(a.len() - suffix) || !new.is_char_boundary(b.len() - suffix) {
            suffix -= 1;
        }

        let old_map = SourceMap::new(old);
        let new_map = SourceMap::new(new);
        let (start, old_end, new_end) = (
            prefix as u32,
            (a.len() - suffix) as u32,
            (b.len() - suffix) as u32,
        );
        Edit {
            start_byte: start,
            old_end_byte: old_end,
            new_end_byte: new_end,
            start_position: old_map.position(start),
            old_end_position: old_map.position(old_end),
            new_end_position: new_map.position(new_end),
        }
    }
}

/// Replaces `start..end` of `source` with `replacement`, returning the new
/// text and the canonical edit.
pub fn apply_edit(
    source: &str,
    start: u32,
    end: u32,
    replacement: &str,
) -> Result<(String, Edit), ParseError> {
    let (s, e) = (start as usize, end as usize);
    if s > e || e > source.len() || !source.is_char_boundary(s) || !source.is_char_boundary(e) {
        return Err(ParseError::invalid_edit(format!(
            "cannot replace {s}..{e} in a text of {} bytes",
            source.len()
        )));
    }
    let mut text = String::with_capacity(source.len() - (e - s) + replacement.len());
    text.push_str(&source[..s]);
    text.push_str(replacement);
    text.push_str(&source[e..]);
    let edit = Edit::replace(start, end, replacement.len() as u32).canonicalize(source, &text)?;
    Ok((text, edit))
}
