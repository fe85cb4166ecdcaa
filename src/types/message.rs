use crate::types::HistoryEntry;

/// Which side of the conversation a transcript message belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Sender {
    /// Typed by the user.
    User,

    /// Produced by the agent, or a substitute shown in its place.
    Bot,
}

/// One rendered entry of the transcript.
///
/// Messages live only on the client; they are never sent back to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Who the message is shown as coming from.
    pub sender: Sender,

    /// The message body.
    pub text: String,

    /// Passages the backend retrieved to produce this reply, if any.
    pub context: Option<String>,
}

impl Message {
    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            context: None,
        }
    }

    /// Create a bot message with optional retrieved context.
    pub fn bot(text: impl Into<String>, context: Option<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
            context,
        }
    }

    /// Returns true if this message came from the user.
    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

impl From<&HistoryEntry> for Message {
    fn from(entry: &HistoryEntry) -> Self {
        if entry.role.is_user() {
            Message::user(entry.content.clone())
        } else {
            Message::bot(entry.content.clone(), None)
        }
    }
}
