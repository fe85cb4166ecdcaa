//! Output rendering for the chat application.
//!
//! This module provides a trait-based rendering abstraction that allows
//! for different output styles. The default implementation uses ANSI
//! escape codes to set the speakers, retrieved context and the history panel
//! apart from one another.

use std::io::{self, Write};

use crate::chat::upload::UploadStatus;
use crate::types::{HistoryEntry, Message, Sender};

/// How much retrieved context is shown under a reply.
pub const CONTEXT_PREVIEW_CHARS: usize = 300;

/// ANSI escape code for dim text (used for the thinking indicator).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for speaker labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the user label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for yellow text (used for retrieved context).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for green text (used for upload success).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for magenta text (used for history roles).
const ANSI_MAGENTA: &str = "\x1b[35m";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
pub trait Renderer: Send {
    /// Print one transcript message.
    ///
    /// Bot messages carrying context also print a preview of it when
    /// `show_context` is on.
    fn print_message(&mut self, message: &Message, show_context: bool);

    /// Print the indicator shown while the agent is working.
    fn print_thinking(&mut self);

    /// Print the history panel.
    fn print_history_panel(&mut self, entries: &[HistoryEntry]);

    /// Print an upload status line.
    fn print_upload_status(&mut self, status: UploadStatus);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// The first [`CONTEXT_PREVIEW_CHARS`] characters of `context`, followed by
/// an ellipsis.
pub fn context_preview(context: &str) -> String {
    let mut preview: String = context.chars().take(CONTEXT_PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

/// Plain text renderer with optional ANSI styling.
///
/// Writes to stdout unless given another writer.
pub struct PlainTextRenderer {
    out: Box<dyn Write + Send>,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }

    /// Creates a renderer that writes somewhere other than stdout.
    pub fn with_writer(out: impl Write + Send + 'static, use_color: bool) -> Self {
        Self {
            out: Box::new(out),
            use_color,
        }
    }

    fn style(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    // Output is best effort; a closed terminal is not worth failing over.
    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_message(&mut self, message: &Message, show_context: bool) {
        let label = match message.sender {
            Sender::User => self.style(ANSI_CYAN, "You"),
            Sender::Bot => self.style(ANSI_BOLD, "Agent"),
        };
        self.line(&format!("{label}: {}", message.text));

        if !show_context || message.sender != Sender::Bot {
            return;
        }
        if let Some(context) = message.context.as_deref() {
            let heading = self.style(ANSI_YELLOW, "Retrieved Context:");
            self.line(&format!("  {heading}"));
            for line in context_preview(context).lines() {
                self.line(&format!("  | {line}"));
            }
        }
    }

    fn print_thinking(&mut self) {
        let text = self.style(ANSI_DIM, "Agent is thinking...");
        self.line(&text);
    }

    fn print_history_panel(&mut self, entries: &[HistoryEntry]) {
        let title = self.style(ANSI_BOLD, "Chat History");
        self.line(&format!("\n{title}"));
        if entries.is_empty() {
            self.line("No saved history.");
        }
        for entry in entries {
            let role = self.style(ANSI_MAGENTA, &entry.role.as_str().to_uppercase());
            self.line(&format!("[{role}] {}", entry.content));
        }
        self.line("(/close to hide)");
    }

    fn print_upload_status(&mut self, status: UploadStatus) {
        let Some(message) = status.message() else {
            return;
        };
        let text = match status {
            UploadStatus::Failed => self.style(ANSI_RED, message),
            UploadStatus::Succeeded => self.style(ANSI_GREEN, message),
            _ => self.style(ANSI_DIM, message),
        };
        self.line(&text);
    }

    fn print_error(&mut self, error: &str) {
        let text = self.style(ANSI_RED, &format!("Error: {error}"));
        self.line(&text);
    }

    fn print_info(&mut self, info: &str) {
        self.line(info);
    }
}
