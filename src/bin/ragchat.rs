//! Interactive chat against a retrieval-augmented agent backend.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a backend on localhost:8001 under the "default" session
//! ragchat
//!
//! # Another backend, another session, context shown under replies
//! ragchat --base-url http://rag.internal:8001 --session-id lab-4 --show-context
//!
//! # Add a document to the knowledge base before chatting
//! ragchat --upload paper.pdf
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/upload <file>` - Upload a .pdf or .txt document
//! - `/history` - Show the saved history
//! - `/close` - Hide the history panel
//! - `/clear` - Clear the conversation
//! - `/context on|off` - Show or hide retrieved context
//! - `/quit` - Exit the application
//!
//! Logging goes to stderr and is controlled by `RAGCHAT_LOG` (default `warn`).

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;
use utf8path::Path;

use ragchat::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, SendOutcome,
    Toggles, UploadStatus, Uploader, help_text, parse_command,
};
use ragchat::{Backend, Transport};

/// How long startup waits for saved history before showing the prompt.
const STARTUP_WAIT: Duration = Duration::from_secs(3);

/// How long a send waits for its refresh before redrawing an open panel.
const REFRESH_WAIT: Duration = Duration::from_secs(3);

/// Main entry point for the ragchat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ChatConfig::from(ChatArgs::parse());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RAGCHAT_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_ansi(config.use_color)
        .with_writer(std::io::stderr)
        .init();

    let backend = Arc::new(Backend::with_options(&config.base_url, config.timeout)?);
    let mut session = ChatSession::new(backend.clone(), config.session_id.clone())
        .with_toggles(Toggles::new().with_context(config.show_context));
    let mut uploader = Uploader::new().with_on_complete(|| tracing::info!("file ready"));
    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    let mut rl = DefaultEditor::new()?;

    println!(
        "RAG Chat (backend: {}, session: {})",
        backend.base_url(),
        session.session_id()
    );
    println!("Type /help for commands, /quit to exit\n");

    if let Some(path) = config.upload.clone() {
        upload(&mut uploader, backend.as_ref(), &mut renderer, path).await;
    }

    session.mount();
    // Anything still outstanding is applied on the next command.
    let _ = tokio::time::timeout(STARTUP_WAIT, session.settle()).await;
    let mut shown = 0;
    print_new_messages(&session, &mut shown, &mut renderer);

    loop {
        let readline = rl.readline("> ");

        match readline {
            Ok(line) => {
                // Queries go out as typed; trimming only decides blank and slash lines.
                if line.trim().is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line.as_str());

                if let Some(cmd) = parse_command(line.trim()) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Upload(path) => {
                            upload(&mut uploader, backend.as_ref(), &mut renderer, Path::from(path))
                                .await;
                        }
                        ChatCommand::History => match session.open_history_panel().await {
                            Ok(()) => print_history_panel(&session, &mut renderer),
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::Close => {
                            session.close_history_panel();
                            renderer.print_info("History panel closed.");
                        }
                        ChatCommand::Clear => match session.clear().await {
                            Ok(()) => {
                                shown = 0;
                                renderer.print_info("Conversation cleared.");
                                print_history_panel(&session, &mut renderer);
                            }
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::Context(show) => {
                            session.set_show_context(show);
                            if show {
                                renderer.print_info("Retrieved context shown.");
                            } else {
                                renderer.print_info("Retrieved context hidden.");
                            }
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // History that landed since the last command hydrates first.
                session.apply_background();
                print_new_messages(&session, &mut shown, &mut renderer);
                // The typed line already shows the user message.
                shown += 1;

                let mut loading = session.loading();
                let outcome = {
                    let send = session.send(&line);
                    tokio::pin!(send);
                    loop {
                        tokio::select! {
                            biased;
                            outcome = &mut send => break outcome,
                            Ok(()) = loading.changed() => {
                                if *loading.borrow_and_update() {
                                    renderer.print_thinking();
                                }
                            }
                        }
                    }
                };
                if let SendOutcome::Failed(err) = &outcome {
                    tracing::debug!("send failed: {err}");
                }
                print_new_messages(&session, &mut shown, &mut renderer);
                if outcome.is_replied() && session.history_panel().is_some() {
                    let _ = tokio::time::timeout(REFRESH_WAIT, session.settle()).await;
                    print_history_panel(&session, &mut renderer);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

async fn upload(
    uploader: &mut Uploader,
    transport: &dyn Transport,
    renderer: &mut dyn Renderer,
    path: Path<'_>,
) {
    if !uploader.select(path) {
        renderer.print_info("Only .pdf and .txt files can be uploaded.");
        return;
    }
    let mut status = uploader.subscribe();
    let finished = {
        let upload = uploader.upload(transport);
        tokio::pin!(upload);
        loop {
            tokio::select! {
                biased;
                finished = &mut upload => break finished,
                Ok(()) = status.changed() => {
                    let current = *status.borrow_and_update();
                    if current == UploadStatus::Ingesting {
                        renderer.print_upload_status(current);
                    }
                }
            }
        }
    };
    if let Some(status) = finished {
        renderer.print_upload_status(status);
    }
}

fn print_history_panel(session: &ChatSession, renderer: &mut dyn Renderer) {
    if let Some(entries) = session.history_panel() {
        renderer.print_history_panel(entries);
    }
}

fn print_new_messages(session: &ChatSession, shown: &mut usize, renderer: &mut dyn Renderer) {
    let messages = session.messages();
    let start = (*shown).min(messages.len());
    for message in &messages[start..] {
        renderer.print_message(message, session.toggles().show_context());
    }
    *shown = messages.len();
}
