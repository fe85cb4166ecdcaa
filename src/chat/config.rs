//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `clap` and the resolved
//! configuration the binary builds its session from.

use std::time::Duration;

use clap::Parser;
use utf8path::Path;

use crate::client::DEFAULT_BASE_URL;
use crate::types::SessionId;

/// Command-line arguments for the ragchat tool.
#[derive(Parser, Debug, Default, PartialEq)]
#[command(name = "ragchat")]
#[command(about = "Chat with a retrieval-augmented agent backend", long_about = None)]
pub struct ChatArgs {
    /// Backend base URL (default: http://localhost:8001).
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Session the conversation is stored under (default: "default").
    #[arg(long, value_name = "ID")]
    pub session_id: Option<String>,

    /// Give up on a backend call after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Start with retrieved context visible.
    #[arg(long)]
    pub show_context: bool,

    /// Disable ANSI colors/styles.
    #[arg(long)]
    pub no_color: bool,

    /// Upload this document before the first prompt.
    #[arg(long, value_name = "PATH")]
    pub upload: Option<Path<'static>>,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Where the agent backend listens.
    pub base_url: String,

    /// The session every request is scoped to.
    pub session_id: SessionId,

    /// Optional per-request timeout.  `None` waits indefinitely.
    pub timeout: Option<Duration>,

    /// Whether retrieved context starts visible.
    pub show_context: bool,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// A document to upload on startup.
    pub upload: Option<Path<'static>>,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Base URL: http://localhost:8001
    /// - Session: "default"
    /// - Timeout: none
    /// - Context: hidden
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            session_id: SessionId::default(),
            timeout: None,
            show_context: false,
            use_color: true,
            upload: None,
        }
    }

    /// Sets the backend base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the session id.
    pub fn with_session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = session_id;
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets whether retrieved context starts visible.
    pub fn with_show_context(mut self, show: bool) -> Self {
        self.show_context = show;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets the document uploaded on startup.
    pub fn with_upload(mut self, path: Option<Path<'static>>) -> Self {
        self.upload = path;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        ChatConfig {
            base_url: args
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            session_id: args.session_id.map(SessionId::from).unwrap_or_default(),
            timeout: args.timeout_secs.map(Duration::from_secs),
            show_context: args.show_context,
            use_color: !args.no_color,
            upload: args.upload,
        }
    }
}
