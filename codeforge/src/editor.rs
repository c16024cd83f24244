use stylus::Key;
use stylus::metrics::{LineTable, Position, is_indentation};

/// Spaces inserted by a Tab press
const TAB_WIDTH: usize = 2;

/// What an edit did to the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Changed,
    Moved,
    Nothing,
}

/// The learner's free-form editor used in lenient mode
#[derive(Debug, Clone, Default)]
pub struct EditorBuffer {
    chars: Vec<char>,
    /// Char offset of the cursor
    cursor: usize,
}

impl EditorBuffer {
    /// Create a buffer with the cursor at the end of `text`
    pub fn new(text: &str) -> Self {
        let chars: Vec<char> = text.replace("\r\n", "\n").chars().collect();
        let cursor = chars.len();
        Self { chars, cursor }
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    /// 1-based line and column of the cursor
    pub fn position(&self) -> Position {
        LineTable::new(&self.text()).position(self.cursor)
    }

    /// Apply a key press
    pub fn apply(&mut self, key: &Key) -> Edit {
        match key {
            Key::Char(char) => self.insert(&[*char]),
            Key::Enter => {
                let indentation = self.current_indentation();
                let mut inserted = Vec::with_capacity(indentation.len() + 1);
                inserted.push('\n');
                inserted.extend(indentation);
                self.insert(&inserted)
            }
            Key::Tab => self.insert(&[' '; TAB_WIDTH]),
            Key::Backspace => {
                if self.cursor == 0 {
                    return Edit::Nothing;
                }
                self.cursor -= 1;
                self.chars.remove(self.cursor);
                Edit::Changed
            }
            Key::Delete => {
                if self.cursor == self.chars.len() {
                    return Edit::Nothing;
                }
                self.chars.remove(self.cursor);
                Edit::Changed
            }
            Key::Left => self.move_to(self.cursor.saturating_sub(1)),
            Key::Right => self.move_to((self.cursor + 1).min(self.chars.len())),
            Key::Home => self.move_to(self.line_start(self.cursor)),
            Key::End => self.move_to(self.line_end(self.cursor)),
            Key::Up => self.move_vertically(false),
            Key::Down => self.move_vertically(true),
            _ => Edit::Nothing,
        }
    }

    fn insert(&mut self, inserted: &[char]) -> Edit {
        let tail = self.chars.split_off(self.cursor);
        self.chars.extend_from_slice(inserted);
        self.chars.extend(tail);
        self.cursor += inserted.len();
        Edit::Changed
    }

    fn move_to(&mut self, cursor: usize) -> Edit {
        if cursor == self.cursor {
            return Edit::Nothing;
        }
        self.cursor = cursor;
        Edit::Moved
    }

    fn move_vertically(&mut self, down: bool) -> Edit {
        let start = self.line_start(self.cursor);
        let column = self.cursor - start;

        let line_start = if down {
            let end = self.line_end(self.cursor);
            if end == self.chars.len() {
                return Edit::Nothing;
            }
            end + 1
        } else {
            if start == 0 {
                return Edit::Nothing;
            }
            self.line_start(start - 1)
        };

        let line_len = self.line_end(line_start) - line_start;
        self.move_to(line_start + column.min(line_len))
    }

    fn line_start(&self, offset: usize) -> usize {
        self.chars[..offset]
            .iter()
            .rposition(|&char| char == '\n')
            .map_or(0, |newline| newline + 1)
    }

    fn line_end(&self, offset: usize) -> usize {
        self.chars[offset..]
            .iter()
            .position(|&char| char == '\n')
            .map_or(self.chars.len(), |newline| offset + newline)
    }

    /// Leading indentation of the cursor's line, up to the cursor
    fn current_indentation(&self) -> Vec<char> {
        let start = self.line_start(self.cursor);
        self.chars[start..self.cursor]
            .iter()
            .copied()
            .take_while(|&char| is_indentation(char))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(editor: &mut EditorBuffer, text: &str) {
        for char in text.chars() {
            editor.apply(&Key::Char(char));
        }
    }

    #[test]
    fn test_insert_and_backspace() {
        let mut editor = EditorBuffer::new("let");
        type_str(&mut editor, " x");
        assert_eq!(editor.text(), "let x");

        assert_eq!(editor.apply(&Key::Backspace), Edit::Changed);
        assert_eq!(editor.text(), "let ");

        let mut empty = EditorBuffer::default();
        assert_eq!(empty.apply(&Key::Backspace), Edit::Nothing);
    }

    #[test]
    fn test_enter_keeps_indentation() {
        let mut editor = EditorBuffer::new("fn main() {\n    let a = 1;");
        editor.apply(&Key::Enter);
        type_str(&mut editor, "b");

        assert_eq!(editor.text(), "fn main() {\n    let a = 1;\n    b");
        assert_eq!(editor.position(), Position { line: 3, column: 6 });
    }

    #[test]
    fn test_tab_inserts_spaces() {
        let mut editor = EditorBuffer::default();
        editor.apply(&Key::Tab);
        assert_eq!(editor.text(), "  ");
    }

    #[test]
    fn test_editing_in_the_middle() {
        let mut editor = EditorBuffer::new("ac");
        assert_eq!(editor.apply(&Key::Left), Edit::Moved);
        type_str(&mut editor, "b");
        assert_eq!(editor.text(), "abc");
        assert_eq!(editor.position(), Position { line: 1, column: 3 });

        assert_eq!(editor.apply(&Key::Delete), Edit::Changed);
        assert_eq!(editor.text(), "ab");
        assert_eq!(editor.apply(&Key::Delete), Edit::Nothing);
    }

    #[test]
    fn test_vertical_movement_clamps_column() {
        let mut editor = EditorBuffer::new("long line\nab\nlast line");
        editor.apply(&Key::Up);
        assert_eq!(editor.position(), Position { line: 2, column: 3 });

        editor.apply(&Key::Up);
        assert_eq!(editor.position(), Position { line: 1, column: 3 });
        assert_eq!(editor.apply(&Key::Up), Edit::Nothing);

        editor.apply(&Key::End);
        assert_eq!(editor.position(), Position { line: 1, column: 10 });
        editor.apply(&Key::Down);
        editor.apply(&Key::Down);
        assert_eq!(editor.position(), Position { line: 3, column: 3 });
        assert_eq!(editor.apply(&Key::Down), Edit::Nothing);

        editor.apply(&Key::Home);
        assert_eq!(editor.position(), Position { line: 3, column: 1 });
    }
}
