//! The rendered message list.

use crate::types::{HistoryEntry, Message};

/// The messages shown in the main chat pane, oldest first.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// The messages in display order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true when nothing is shown.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Appends what the user typed.
    pub fn append_user_message(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    /// Appends a reply, or the text shown in place of one.
    pub fn append_bot_message(&mut self, text: impl Into<String>, context: Option<String>) {
        self.messages.push(Message::bot(text, context));
    }

    /// Populates an empty transcript from persisted history.
    ///
    /// Does nothing once the transcript holds any message.  Returns whether
    /// anything was added.
    pub fn hydrate_from_history(&mut self, entries: &[HistoryEntry]) -> bool {
        if !self.messages.is_empty() || entries.is_empty() {
            return false;
        }
        self.messages = entries.iter().map(Message::from).collect();
        true
    }

    /// Removes every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
