//! # Metrics Module - Offsets, Positions and Whitespace Projections
//!
//! Pure helpers for moving between the coordinate systems the engine works in:
//!
//! - a flat **character offset** into a multi-line string,
//! - a 1-based **line/column** [`Position`] within that string,
//! - an index into the **whitespace-stripped projection** of that string.
//!
//! All offsets count `char`s, not bytes, so multi-byte characters occupy a single slot.
//!
//! ```text
//! Text:         [i][f][ ][x][\n][ ][ ][y]
//! Offsets:       0  1  2  3  4   5  6  7
//! Stripped:     [i][f]   [x]        [y]
//! StripIndex:   [0][1]   [3]        [7]
//! ```
//!
//! Every function here is total: out-of-range offsets are clamped to the nearest valid
//! boundary instead of panicking.

use std::ops::Range;

/// Whether a character belongs to the whitespace class ignored by matching
pub fn is_ignorable(char: char) -> bool {
    char.is_whitespace()
}

/// Whether a character is indentation (space or tab)
pub fn is_indentation(char: char) -> bool {
    char == ' ' || char == '\t'
}

/// A 1-based line/column position within a text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Precomputed table of line lengths for a fixed text
///
/// Lookups walk the table instead of re-scanning the text, so converting an offset
/// costs O(L) where L is the number of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTable {
    /// Character count of every line, excluding the terminating newline
    lines: Vec<usize>,
    /// Total number of characters in the text, newlines included
    text_len: usize,
}

impl LineTable {
    pub fn new(text: &str) -> Self {
        let lines: Vec<usize> = text.split('\n').map(|line| line.chars().count()).collect();
        // Every line but the last is followed by a newline
        let text_len = lines.iter().sum::<usize>() + lines.len() - 1;

        Self { lines, text_len }
    }

    /// Number of lines in the text. An empty text still has one (empty) line.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total number of characters in the text
    pub fn text_len(&self) -> usize {
        self.text_len
    }

    /// Convert a character offset into a 1-based line/column position
    ///
    /// A newline belongs to the line it terminates. An offset equal to the text length
    /// yields the end-of-file position just after the last character.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.text_len);
        let mut start = 0;

        for (index, len) in self.lines.iter().enumerate() {
            if offset <= start + len {
                return Position {
                    line: index + 1,
                    column: offset - start + 1,
                };
            }
            start += len + 1;
        }

        // Only reachable if the table is inconsistent with `text_len`
        Position {
            line: self.lines.len(),
            column: self.lines.last().map_or(1, |len| len + 1),
        }
    }

    /// Offset of the first character of a 1-based line (clamped to the last line)
    pub fn line_start(&self, line: usize) -> usize {
        let line = line.clamp(1, self.lines.len());
        self.lines[..line - 1].iter().map(|len| len + 1).sum()
    }

    /// Offsets covered by the content of a 1-based line, newline excluded
    pub fn line_range(&self, line: usize) -> Range<usize> {
        let line = line.clamp(1, self.lines.len());
        let start = self.line_start(line);
        start..start + self.lines[line - 1]
    }

    /// The 1-based line containing an offset
    pub fn line_of(&self, offset: usize) -> usize {
        self.position(offset).line
    }
}

/// Convert an offset into a position for a one-off lookup
///
/// Builds a [`LineTable`] for the call. Keep a table around when converting repeatedly
/// over the same text.
pub fn offset_to_position(text: &str, offset: usize) -> Position {
    LineTable::new(text).position(offset)
}

/// Remove every whitespace character from a text
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|char| !is_ignorable(*char)).collect()
}

/// Maps "index into the whitespace-stripped projection" back to "offset in the text"
///
/// Monotonically increasing, with one entry per non-whitespace character.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StripIndex(Vec<usize>);

impl StripIndex {
    /// Number of non-whitespace characters in the indexed text
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Offset of the non-whitespace character with the given stripped index
    pub fn get(&self, stripped_index: usize) -> Option<usize> {
        self.0.get(stripped_index).copied()
    }

    /// Offset just past the last of the first `matched` non-whitespace characters
    ///
    /// `0` when nothing is matched. Clamped to the last indexed character.
    pub fn offset_after(&self, matched: usize) -> usize {
        match matched.min(self.0.len()) {
            0 => 0,
            count => self.0[count - 1] + 1,
        }
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

/// Record the offset of every non-whitespace character of a text
pub fn build_strip_index(text: &str) -> StripIndex {
    StripIndex(
        text.chars()
            .enumerate()
            .filter(|(_, char)| !is_ignorable(*char))
            .map(|(offset, _)| offset)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_of_offsets() {
        let text = "ab\ncd";
        let table = LineTable::new(text);

        assert_eq!(table.position(0), Position { line: 1, column: 1 });
        // The newline belongs to the line it terminates
        assert_eq!(table.position(2), Position { line: 1, column: 3 });
        assert_eq!(table.position(3), Position { line: 2, column: 1 });
        // End of file
        assert_eq!(table.position(5), Position { line: 2, column: 3 });
        assert_eq!(offset_to_position(text, 4), Position { line: 2, column: 2 });
    }

    #[test]
    fn test_position_clamps_out_of_range() {
        let table = LineTable::new("abc");
        assert_eq!(table.position(99), Position { line: 1, column: 4 });

        let empty = LineTable::new("");
        assert_eq!(empty.line_count(), 1);
        assert_eq!(empty.text_len(), 0);
        assert_eq!(empty.position(0), Position { line: 1, column: 1 });
        assert_eq!(empty.position(3), Position { line: 1, column: 1 });
    }

    #[test]
    fn test_trailing_newline_opens_a_new_line() {
        let table = LineTable::new("a\n");
        assert_eq!(table.line_count(), 2);
        assert_eq!(table.text_len(), 2);
        assert_eq!(table.position(2), Position { line: 2, column: 1 });
    }

    #[test]
    fn test_line_ranges() {
        let table = LineTable::new("if (x) {\n  y();\n}");

        assert_eq!(table.line_range(1), 0..8);
        assert_eq!(table.line_range(2), 9..15);
        assert_eq!(table.line_range(3), 16..17);
        // Clamped
        assert_eq!(table.line_range(0), 0..8);
        assert_eq!(table.line_range(9), 16..17);
        assert_eq!(table.line_of(10), 2);
    }

    #[test]
    fn test_unicode_offsets_count_chars() {
        let table = LineTable::new("café\n🚀");
        assert_eq!(table.text_len(), 6);
        assert_eq!(table.position(5), Position { line: 2, column: 1 });
        assert_eq!(table.position(6), Position { line: 2, column: 2 });
    }

    #[test]
    fn test_strip_whitespace() {
        assert_eq!(strip_whitespace("if (x) {\n  y();\n}"), "if(x){y();}");
        assert_eq!(strip_whitespace(" \t\r\n"), "");
        assert_eq!(strip_whitespace(""), "");
    }

    #[test]
    fn test_strip_index() {
        let text = "if x\n  y";
        let index = build_strip_index(text);

        assert_eq!(index.as_slice(), &[0, 1, 3, 7]);
        assert_eq!(index.len(), strip_whitespace(text).chars().count());
        assert_eq!(index.get(2), Some(3));
        assert_eq!(index.get(4), None);

        assert_eq!(index.offset_after(0), 0);
        assert_eq!(index.offset_after(2), 2);
        assert_eq!(index.offset_after(3), 4);
        assert_eq!(index.offset_after(99), 8);

        assert!(build_strip_index("   ").is_empty());
    }
}
