/// Maximum number of characters accepted by a compose prompt.
pub const CHAR_LIMIT: usize = 100;

/// An editing keystroke forwarded to the active text input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Insert(char),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
}

/// Single-line text buffer with a caret, used by the compose prompt.
#[derive(Debug, Clone)]
pub struct TextInput {
    value: String,
    cursor: usize,
    placeholder: &'static str,
    char_limit: usize,
}

impl TextInput {
    pub fn new(placeholder: &'static str) -> Self {
        TextInput {
            value: String::new(),
            cursor: 0,
            placeholder,
            char_limit: CHAR_LIMIT,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn reset(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn apply(&mut self, edit: Edit) {
        match edit {
            Edit::Insert(ch) => self.insert_char(ch),
            Edit::Backspace => self.backspace(),
            Edit::Delete => self.delete(),
            Edit::Left => self.cursor = prev_boundary(self.cursor, &self.value),
            Edit::Right => self.cursor = next_boundary(self.cursor, &self.value),
            Edit::Home => self.cursor = 0,
            Edit::End => self.cursor = self.value.len(),
        }
    }

    /// The value with a block caret spliced in at the cursor.
    pub fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert(self.cursor, '▌');
        text
    }

    fn insert_char(&mut self, ch: char) {
        if ch.is_control() || self.value.chars().count() >= self.char_limit {
            return;
        }
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_boundary(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn delete(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        let next = next_boundary(self.cursor, &self.value);
        self.value.drain(self.cursor..next);
    }
}

fn prev_boundary(cursor: usize, text: &str) -> usize {
    text[..cursor]
        .char_indices()
        .next_back()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_boundary(cursor: usize, text: &str) -> usize {
    text[cursor..]
        .chars()
        .next()
        .map(|ch| cursor + ch.len_utf8())
        .unwrap_or(text.len())
}
