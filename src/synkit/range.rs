//! Position and range tracking for source locations
//!
//! This module defines the data structures for representing ranges in source text, as well
//! as utilities for converting offsets to line/column positions.
//!
//! ## Types
//!
//! - [`TextRange`] - A half-open `[start, end)` interval of source offsets
//! - [`Position`] - A line:column position in source text
//! - [`SourceLocation`] - Utility for converting offsets to positions
//!
//! ## Key Design
//!
//! - **Offsets are UTF-8 byte offsets** that always fall on character boundaries, so a range
//!   always slices cleanly out of the source `&str`.
//! - **Half-open**: `end` is exclusive. Zero-width ranges (`start == end`) are legal and are
//!   used for the `Eof` token and for empty nodes.
//! - **Lines and columns are computed lazily**: tokens and nodes only carry offsets; the
//!   diagnostics layer converts with [`SourceLocation`] in O(log n).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range as ByteRange;

/// A half-open interval of source offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "invalid range {}..{}", start, end);
        Self { start, end }
    }

    /// A zero-width range at `offset`
    pub fn empty(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if an offset is contained within this range (end exclusive)
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Check if another range lies entirely within this range
    pub fn contains_range(&self, other: TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Build the smallest range covering both ranges
    pub fn cover(self, other: TextRange) -> TextRange {
        TextRange::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Build a bounding box that contains all provided ranges.
    pub fn bounding_box<I>(mut ranges: I) -> Option<TextRange>
    where
        I: Iterator<Item = TextRange>,
    {
        let first = ranges.next()?;
        Some(ranges.fold(first, TextRange::cover))
    }

    pub fn as_byte_range(&self) -> ByteRange<usize> {
        self.start..self.end
    }
}

impl From<ByteRange<usize>> for TextRange {
    fn from(range: ByteRange<usize>) -> Self {
        TextRange::new(range.start, range.end)
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Represents a position in source text (zero-based line and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-based for humans
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// Provides fast conversion from offsets to line/column positions
pub struct SourceLocation<'a> {
    source: &'a str,
    /// Byte offsets where each line starts
    line_starts: Vec<usize>,
}

impl<'a> SourceLocation<'a> {
    /// Create a new SourceLocation from source text
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];

        // Line ends match the lexer's linebreaks: `\r\n`, `\r` and `\n`
        let bytes = source.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                    i += 2;
                    line_starts.push(i);
                }
                b'\r' | b'\n' => {
                    i += 1;
                    line_starts.push(i);
                }
                _ => i += 1,
            }
        }

        Self {
            source,
            line_starts,
        }
    }

    /// Convert an offset to a line/column position.
    ///
    /// Columns count characters, not bytes. Offsets past the end clamp to the end.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        let line = self
            .line_starts
            .binary_search(&offset)
            .unwrap_or_else(|i| i - 1);

        let line_start = self.line_starts[line];
        let column = self
            .source
            .get(line_start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(offset - line_start);

        Position::new(line, column)
    }

    /// Convert a range to its start and end positions
    pub fn positions(&self, range: TextRange) -> (Position, Position) {
        (self.position(range.start), self.position(range.end))
    }

    /// Get the total number of lines in the source
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Get the byte offset for the start of a line
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// The text of a line, without its line end
    pub fn line_text(&self, line: usize) -> Option<&'a str> {
        let start = self.line_start(line)?;
        let end = self.line_start(line + 1).unwrap_or(self.source.len());
        self.source
            .get(start..end)
            .map(|text| text.trim_end_matches(|c: char| c == '\n' || c == '\r'))
    }
}
