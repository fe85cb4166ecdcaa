// Public modules
pub mod chat;
pub mod client;
pub mod error;
pub mod types;

// Re-exports
pub use chat::{ChatSession, SendOutcome, Uploader, UploadStatus};
pub use client::{Backend, DEFAULT_BASE_URL, Transport};
pub use error::{Cause, Error, Result};
pub use types::*;
