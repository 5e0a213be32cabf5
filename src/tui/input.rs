//! Single-line command editor with a recall list.

use unicode_width::UnicodeWidthStr;

/// Editable text with a cursor measured in characters.
#[derive(Debug, Default, Clone)]
pub struct InputLine {
    text: String,
    cursor: usize,
}

impl InputLine {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Display column of the cursor.
    pub fn cursor_column(&self) -> usize {
        UnicodeWidthStr::width(&self.text[..self.byte_index()])
    }

    fn byte_index(&self) -> usize {
        self.text
            .char_indices()
            .nth(self.cursor)
            .map_or(self.text.len(), |(i, _)| i)
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn insert(&mut self, c: char) {
        let idx = self.byte_index();
        self.text.insert(idx, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let idx = self.byte_index();
        self.text.remove(idx);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let idx = self.byte_index();
            self.text.remove(idx);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_count());
    }

    pub const fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.char_count();
    }

    /// Delete from the cursor back to the start of the previous word.
    pub fn delete_word(&mut self) {
        while self.cursor > 0 && self.text[..self.byte_index()].ends_with(' ') {
            self.backspace();
        }
        while self.cursor > 0 && !self.text[..self.byte_index()].ends_with(' ') {
            self.backspace();
        }
    }

    /// Replace the text, cursor at the end.
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.end();
    }

    /// Take the text, leaving the line empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }
}

/// Previously entered commands, browsed with Up/Down.
#[derive(Debug, Default, Clone)]
pub struct Recall {
    entries: Vec<String>,
    /// Position while browsing; `None` when editing a fresh line.
    index: Option<usize>,
}

impl Recall {
    pub fn push(&mut self, entry: &str) {
        self.index = None;
        if entry.trim().is_empty() || self.entries.last().is_some_and(|last| last == entry) {
            return;
        }
        self.entries.push(entry.to_string());
    }

    /// Older entry, stopping at the oldest.
    pub fn older(&mut self) -> Option<&str> {
        let idx = match self.index {
            None => self.entries.len().checked_sub(1)?,
            Some(i) => i.saturating_sub(1),
        };
        self.index = Some(idx);
        self.entries.get(idx).map(String::as_str)
    }

    /// Newer entry; `None` (back to a blank line) past the newest.
    pub fn newer(&mut self) -> Option<&str> {
        let idx = self.index? + 1;
        if idx >= self.entries.len() {
            self.index = None;
            return None;
        }
        self.index = Some(idx);
        self.entries.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
