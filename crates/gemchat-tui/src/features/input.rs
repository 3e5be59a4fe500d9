//! Single-line input editor with submission history.
//!
//! Shared by the chat prompt, the feedback correction prompt, and the
//! sample-entry flow. Cursor positions are char indices, not bytes.

/// Editable line state.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    value: String,
    /// Cursor position in chars.
    cursor: usize,
    /// Previously submitted lines, oldest first.
    pub history: Vec<String>,
    /// Index into `history` while recalling, None when editing fresh input.
    history_index: Option<usize>,
    /// Stashed in-progress value while recalling history.
    stash: String,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn insert_char(&mut self, c: char) {
        let byte = self.byte_offset(self.cursor);
        self.value.insert(byte, c);
        self.cursor += 1;
        self.history_index = None;
    }

    pub fn delete_back(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let byte = self.byte_offset(self.cursor - 1);
        self.value.remove(byte);
        self.cursor -= 1;
        self.history_index = None;
    }

    pub fn delete_forward(&mut self) {
        if self.cursor >= self.char_len() {
            return;
        }
        let byte = self.byte_offset(self.cursor);
        self.value.remove(byte);
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_len());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Clears everything, including any history recall in progress.
    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
        self.history_index = None;
    }

    /// Takes the trimmed value, pushes it to history, and resets the editor.
    /// Returns None for blank input.
    pub fn submit(&mut self) -> Option<String> {
        let text = self.value.trim().to_string();
        self.clear();
        if text.is_empty() {
            return None;
        }
        if self.history.last() != Some(&text) {
            self.history.push(text.clone());
        }
        Some(text)
    }

    /// Recalls the previous history entry (Up arrow).
    pub fn recall_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let next_index = match self.history_index {
            None => {
                self.stash = self.value.clone();
                self.history.len() - 1
            }
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.history_index = Some(next_index);
        self.value = self.history[next_index].clone();
        self.cursor = self.char_len();
    }

    /// Recalls the next history entry, restoring the stashed draft at the end.
    pub fn recall_next(&mut self) {
        let Some(index) = self.history_index else {
            return;
        };
        if index + 1 < self.history.len() {
            self.history_index = Some(index + 1);
            self.value = self.history[index + 1].clone();
        } else {
            self.history_index = None;
            self.value = std::mem::take(&mut self.stash);
        }
        self.cursor = self.char_len();
    }

    fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map_or(self.value.len(), |(byte, _)| byte)
    }
}
