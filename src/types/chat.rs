use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{HistoryEntry, SessionId};

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest<'a> {
    /// The user's current message.
    pub message: &'a str,

    /// Every round trip that completed earlier in this session.
    pub history: &'a [HistoryEntry],

    /// The session the exchange belongs to.
    pub session_id: &'a SessionId,
}

impl<'a> ChatRequest<'a> {
    /// Create a new chat request.
    pub fn new(message: &'a str, history: &'a [HistoryEntry], session_id: &'a SessionId) -> Self {
        Self {
            message,
            history,
            session_id,
        }
    }
}

/// Body returned by `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    /// The agent's answer.
    pub response: String,

    /// Retrieved passages backing the answer.  An empty string is normalized
    /// to `None`.
    #[serde(
        default,
        alias = "retrieved_context",
        deserialize_with = "deserialize_context"
    )]
    pub context: Option<String>,
}

impl ChatReply {
    /// Create a reply.
    pub fn new(response: impl Into<String>, context: Option<String>) -> Self {
        Self {
            response: response.into(),
            context: context.filter(|c| !c.is_empty()),
        }
    }
}

fn deserialize_context<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let context = Option::<String>::deserialize(deserializer)?;
    Ok(context.filter(|c| !c.is_empty()))
}

/// Body returned by `GET /api/history`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HistoryResponse {
    /// Everything the server has persisted for the session, oldest first.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}
