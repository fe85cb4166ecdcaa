//! Slash command parsing for the chat application.
//!
//! Input starting with `/` controls the session (uploads, the history panel,
//! clearing) and is never sent to the agent.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Select a document and upload it to the knowledge base.
    Upload(String),

    /// Fetch the saved history and show the history panel.
    History,

    /// Hide the history panel.
    Close,

    /// Clear the conversation here and on the backend.
    Clear,

    /// Show or hide retrieved context under replies.
    Context(bool),

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be treated as a query.
///
/// # Examples
///
/// ```
/// # use ragchat::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/upload paper.pdf").is_some());
/// assert!(parse_command("What is FAISS?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "upload" => match argument {
            Some(path) => ChatCommand::Upload(path.to_string()),
            None => ChatCommand::Invalid("/upload requires a file path".to_string()),
        },
        "history" => ChatCommand::History,
        "close" => ChatCommand::Close,
        "clear" => ChatCommand::Clear,
        "context" => match argument.and_then(parse_on_off) {
            Some(value) => ChatCommand::Context(value),
            None => ChatCommand::Invalid("/context expects 'on' or 'off'".to_string()),
        },
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /upload <file>         Add a .pdf or .txt document to the knowledge base
  /history               Show the saved conversation history
  /close                 Hide the history panel
  /clear                 Clear the conversation here and on the backend
  /context on|off        Show or hide retrieved context under replies
  /help                  Show this help message
  /quit                  Exit the chat
Anything else is sent to the agent."#
}
