//! # Target Module - The Immutable Reference Snippet
//!
//! A [`Target`] is the code a learner has to reproduce. It is prepared once when a lesson
//! loads and never mutated afterwards. Preparing it builds every derived index the engine
//! needs on each keystroke:
//!
//! - the characters of the text, for O(1) "expected next character" lookups,
//! - the whitespace-stripped projection, for matching,
//! - the [`StripIndex`], for translating match counts back into offsets,
//! - the [`LineTable`], for line-scoped regions and positions.
//!
//! Windows line endings are normalized to `\n` so that lesson files authored on any
//! platform produce the same target.

use crate::metrics::{self, LineTable, Position, StripIndex};

/// Prepared target text with its derived indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// The normalized target text
    text: String,
    /// Characters of the text, indexed by offset
    characters: Vec<char>,
    /// The text with all whitespace removed
    stripped: Vec<char>,
    /// Stripped index -> offset in `text`
    strip_index: StripIndex,
    /// Line lengths for offset/position conversion
    lines: LineTable,
}

impl Target {
    /// Prepare a target text
    ///
    /// Never fails. A text without any non-whitespace character is accepted but can never
    /// be completed.
    pub fn new(text: &str) -> Self {
        let text = text.replace("\r\n", "\n");
        let characters: Vec<char> = text.chars().collect();
        let stripped = characters
            .iter()
            .copied()
            .filter(|char| !metrics::is_ignorable(*char))
            .collect();
        let strip_index = metrics::build_strip_index(&text);
        let lines = LineTable::new(&text);

        Self {
            text,
            characters,
            stripped,
            strip_index,
            lines,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of characters in the target, whitespace included
    pub fn text_len(&self) -> usize {
        self.characters.len()
    }

    /// Number of non-whitespace characters, i.e. the `totalChars` a learner must match
    pub fn total_chars(&self) -> usize {
        self.stripped.len()
    }

    /// Whether the target can ever be completed
    pub fn is_completable(&self) -> bool {
        !self.stripped.is_empty()
    }

    /// The character at an offset
    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.characters.get(offset).copied()
    }

    /// Characters of the target from an offset onwards (empty when out of range)
    pub fn chars_from(&self, offset: usize) -> &[char] {
        &self.characters[offset.min(self.characters.len())..]
    }

    /// The first `len` characters of the target as a string
    pub fn prefix(&self, len: usize) -> String {
        self.characters[..len.min(self.characters.len())]
            .iter()
            .collect()
    }

    pub fn stripped(&self) -> &[char] {
        &self.stripped
    }

    pub fn strip_index(&self) -> &StripIndex {
        &self.strip_index
    }

    pub fn lines(&self) -> &LineTable {
        &self.lines
    }

    /// Position of an offset within the target
    pub fn position(&self, offset: usize) -> Position {
        self.lines.position(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_new() {
        let target = Target::new("if (x) {\n  y();\n}");

        assert_eq!(target.text_len(), 17);
        assert_eq!(target.total_chars(), 11);
        assert!(target.is_completable());
        assert_eq!(target.char_at(0), Some('i'));
        assert_eq!(target.char_at(8), Some('\n'));
        assert_eq!(target.char_at(17), None);
        assert_eq!(target.lines().line_count(), 3);
        assert_eq!(target.strip_index().len(), target.total_chars());
    }

    #[test]
    fn test_target_normalizes_line_endings() {
        let target = Target::new("a\r\nb");
        assert_eq!(target.as_str(), "a\nb");
        assert_eq!(target.text_len(), 3);
    }

    #[test]
    fn test_degenerate_targets() {
        let empty = Target::new("");
        assert_eq!(empty.text_len(), 0);
        assert_eq!(empty.total_chars(), 0);
        assert!(!empty.is_completable());
        assert!(empty.chars_from(4).is_empty());

        let blank = Target::new(" \n\t");
        assert_eq!(blank.text_len(), 3);
        assert!(!blank.is_completable());
    }

    #[test]
    fn test_prefix_and_slices() {
        let target = Target::new("héllo");
        assert_eq!(target.prefix(2), "hé");
        assert_eq!(target.prefix(99), "héllo");
        assert_eq!(target.chars_from(3), &['l', 'o']);
    }
}
