//! Chat session state for a retrieval-augmented agent front-end.
//!
//! A session keeps two views of one conversation in step: the transcript the
//! user sees, and the role/content history the backend persists and expects
//! with every query.  It supports:
//!
//! - Optimistic sends with a loading flag and a visible error substitute
//! - Hydrating the transcript from saved history on first load
//! - An on-demand history panel and an all-or-nothing clear
//! - Document uploads into the backend's knowledge base
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`store`]: The history sent with requests and the server's copy
//! - [`transcript`]: The rendered message list
//! - [`toggles`]: View-only switches
//! - [`upload`]: Document selection and upload status
//! - [`session`]: The controller that reconciles all of the above
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: Slash command parsing
//! - [`render`]: Terminal output

pub mod commands;
pub mod config;
pub mod render;
pub mod session;
pub mod store;
pub mod toggles;
pub mod transcript;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use render::{CONTEXT_PREVIEW_CHARS, PlainTextRenderer, Renderer, context_preview};
pub use session::{CHAT_ERROR_TEXT, ChatSession, SendOutcome};
pub use store::{FetchTicket, HistoryStore};
pub use toggles::Toggles;
pub use transcript::Transcript;
pub use upload::{UploadStatus, Uploader};
