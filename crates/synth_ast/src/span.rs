//! Span and position types for source locations.

use line_index::{LineIndex, TextSize};
use serde::{Deserialize, Serialize};

/// A position in source text.
///
/// Lines are 1-indexed, columns are 0-indexed UTF-8 byte offsets from the
/// start of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Position {
    /// Byte offset from the start of the source (0-indexed).
    pub offset: u32,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (0-indexed).
    pub column: u32,
}

impl Position {
    /// Creates a new position.
    #[inline]
    pub const fn new(offset: u32, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// The position of the first byte of any source.
    #[inline]
    pub const fn origin() -> Self {
        Self::new(0, 1, 0)
    }
}

/// A span representing a range in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start position (inclusive).
    pub start: Position,
    /// End position (exclusive).
    pub end: Position,
}

impl Span {
    /// Creates a new span.
    #[inline]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Returns the length of the span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.offset.saturating_sub(self.start.offset)
    }

    /// Returns true if the span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start.offset >= self.end.offset
    }

    /// Returns true if this span contains the given offset.
    #[inline]
    pub const fn contains(&self, offset: u32) -> bool {
        self.start.offset <= offset && offset < self.end.offset
    }

    /// Returns true if `other` lies entirely within this span.
    #[inline]
    pub const fn contains_span(&self, other: &Span) -> bool {
        self.start.offset <= other.start.offset && other.end.offset <= self.end.offset
    }

    /// Returns true if this span touches the byte range `[start, end]`.
    ///
    /// The comparison is inclusive on both ends so that zero-width edits at a
    /// span boundary count as touching it.
    #[inline]
    pub const fn touches(&self, start: u32, end: u32) -> bool {
        self.start.offset <= end && start <= self.end.offset
    }

    /// Merges two spans into one that covers both.
    #[inline]
    pub const fn merge(&self, other: &Span) -> Span {
        Span {
            start: if self.start.offset < other.start.offset {
                self.start
            } else {
                other.start
            },
            end: if self.end.offset > other.end.offset {
                self.end
            } else {
                other.end
            },
        }
    }
}

/// Offset to line/column conversion for one source text.
#[derive(Debug)]
pub struct SourceMap {
    index: LineIndex,
    len: u32,
}

impl SourceMap {
    /// Builds the line table for `source`.
    pub fn new(source: &str) -> Self {
        Self {
            index: LineIndex::new(source),
            len: source.len() as u32,
        }
    }

    /// Resolves a byte offset, clamping past-the-end offsets to the end.
    pub fn position(&self, offset: u32) -> Position {
        let offset = offset.min(self.len);
        let lc = self.index.line_col(TextSize::from(offset));
        Position::new(offset, lc.line + 1, lc.col)
    }

    /// Resolves a byte range into a span.
    pub fn span(&self, start: u32, end: u32) -> Span {
        Span::new(self.position(start), self.position(end))
    }

    /// Source length in bytes.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Returns true for an empty source.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
