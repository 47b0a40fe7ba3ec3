use std::ops::Range;

use serde::Serialize;

/// Byte-offset span into grammar source. Start is inclusive, end is exclusive.
///
/// Tokens and tree nodes record where they came from as byte offsets into
/// the original source string. Editor coordinates (one-based line, UTF-16
/// column) are derived on demand through [`LineIndex`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Create a new span from byte offsets.
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span start ({start}) must be <= end ({end})");
        Self { start, end }
    }

    /// Zero-length span at `offset`.
    pub fn empty(offset: u32) -> Self {
        Self::new(offset, offset)
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Whether the span is empty (zero-length).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two spans into one that covers both.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// The span as a `usize` range, for slicing and report rendering.
    pub fn as_range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

/// Pre-computed index of line start positions.
///
/// Grammar tools speak in one-based lines and zero-based columns; the
/// column unit is the UTF-16 code unit so that tool positions line up with
/// LSP positions without a second conversion.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line. The first entry is always 0.
    line_starts: Vec<u32>,
}

impl LineIndex {
    /// Build a line index by scanning the source text for newline characters.
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self { line_starts }
    }

    /// Convert a byte offset to a one-based line and a zero-based UTF-16 column.
    ///
    /// `offset` must fall on a character boundary of `source`; offsets past
    /// the end are clamped.
    pub fn line_col(&self, source: &str, offset: u32) -> (u32, u32) {
        let offset = offset.min(source.len() as u32);
        // partition_point returns the index of the first line start > offset.
        let line_idx = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts[line_idx] as usize;
        let column = utf16_len(&source[line_start..offset as usize]);
        (line_idx as u32 + 1, column)
    }

    /// Return the number of lines in the source.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Length of `text` in UTF-16 code units.
pub fn utf16_len(text: &str) -> u32 {
    text.chars().map(|c| c.len_utf16() as u32).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_new_and_len() {
        let span = Span::new(5, 10);
        assert_eq!(span.len(), 5);
        assert!(!span.is_empty());
        assert_eq!(span.as_range(), 5..10);
    }

    #[test]
    fn span_merge() {
        let merged = Span::new(5, 10).merge(Span::new(8, 15));
        assert_eq!(merged, Span::new(5, 15));
    }

    #[test]
    fn line_col_is_one_based_line_zero_based_column() {
        let src = "grammar T;\nr : A ;";
        let idx = LineIndex::new(src);
        assert_eq!(idx.line_col(src, 0), (1, 0));
        assert_eq!(idx.line_col(src, 8), (1, 8));
        // 'r' begins line 2
        assert_eq!(idx.line_col(src, 11), (2, 0));
        assert_eq!(idx.line_col(src, 15), (2, 4));
    }

    #[test]
    fn line_col_counts_utf16_units() {
        // U+1F600 is four bytes in UTF-8 and two UTF-16 code units.
        let src = "'\u{1F600}' A";
        let idx = LineIndex::new(src);
        let a = src.find('A').unwrap() as u32;
        assert_eq!(idx.line_col(src, a), (1, 5));
    }

    #[test]
    fn line_col_clamps_past_end() {
        let src = "ab\ncd";
        let idx = LineIndex::new(src);
        assert_eq!(idx.line_col(src, 99), (2, 2));
        assert_eq!(idx.line_count(), 2);
    }

    #[test]
    fn utf16_len_of_ascii_and_astral() {
        assert_eq!(utf16_len("expression"), 10);
        assert_eq!(utf16_len("\u{e9}"), 1);
        assert_eq!(utf16_len("\u{1F600}"), 2);
    }
}
