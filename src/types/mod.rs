// Public modules
pub mod chat;
pub mod document;
pub mod history_entry;
pub mod message;
pub mod session_id;

// Re-exports
pub use chat::{ChatReply, ChatRequest, HistoryResponse};
pub use document::{ACCEPTED_EXTENSIONS, Document, DocumentPath};
pub use history_entry::{HistoryEntry, Role};
pub use message::{Message, Sender};
pub use session_id::{DEFAULT_SESSION_ID, SessionId};
