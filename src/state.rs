//! Conversation state for the chat view
//!
//! This module holds the UI-agnostic session: the ordered turn history, the
//! draft being typed and the pending flag. Terminal concerns (scrolling,
//! focus, animation) live in `app`.

/// Agent turn appended when the backend cannot be reached or its reply is unusable
pub const BACKEND_ERROR_REPLY: &str = "⚠️ Error contacting backend.";

/// One message in the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Who a turn is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Agent,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            content: content.into(),
        }
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[derive(Debug, Default)]
pub struct ChatSession {
    turns: Vec<Turn>,
    draft: String,
    cursor: usize, // character index into draft
    pending: bool,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Whether `begin_send` would accept the current draft
    pub fn can_send(&self) -> bool {
        !self.pending && !self.draft.trim().is_empty()
    }

    /// Move the draft into the history as a user turn and mark a request in flight.
    ///
    /// Returns the message to send, or `None` when the draft is blank or a
    /// request is already pending. In that case nothing changes.
    pub fn begin_send(&mut self) -> Option<String> {
        if !self.can_send() {
            return None;
        }

        let message = std::mem::take(&mut self.draft);
        self.cursor = 0;
        self.turns.push(Turn::user(message.clone()));
        self.pending = true;
        Some(message)
    }

    /// Resolve the in-flight request with the backend's reply, or the fixed
    /// error turn when there is none.
    pub fn finish_send(&mut self, reply: Option<String>) {
        let content = reply.unwrap_or_else(|| BACKEND_ERROR_REPLY.to_string());
        self.turns.push(Turn::agent(content));
        self.pending = false;
    }

    // Draft editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.draft, self.cursor);
        self.draft.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.draft, self.cursor);
            self.draft.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.draft.chars().count() {
            let byte_pos = char_to_byte_index(&self.draft, self.cursor);
            self.draft.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.draft.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.draft.chars().count();
    }
}
