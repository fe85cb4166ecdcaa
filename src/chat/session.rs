//! Core chat session management.
//!
//! `ChatSession` owns the transcript, the history store and the
//! presentation toggles, and is the only thing that mutates them.  It
//! reconciles the optimistic transcript with the backend's persisted history
//! across three triggers: mount, send and clear.
//!
//! History refreshes that should not hold up the user (the one issued on
//! mount and the one after every successful send) run as background tasks.
//! Their results come back over a channel and are applied on the session the
//! next time it is driven, so every mutation still happens here.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::chat::store::{FetchTicket, HistoryStore};
use crate::chat::toggles::Toggles;
use crate::chat::transcript::Transcript;
use crate::client::Transport;
use crate::error::{Cause, Error, Result};
use crate::types::{ChatReply, HistoryEntry, Message, SessionId};

/// Shown in place of a reply when the chat call fails.
pub const CHAT_ERROR_TEXT: &str = "Error connecting to backend.";

/// What happened to a send.
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// The query was blank; nothing happened.
    Skipped,

    /// The backend replied.
    Replied(ChatReply),

    /// The chat call failed; the error text was shown instead.
    Failed(Error),
}

impl SendOutcome {
    /// Returns true if the backend replied.
    pub fn is_replied(&self) -> bool {
        matches!(self, SendOutcome::Replied(_))
    }
}

struct Refresh {
    ticket: FetchTicket,
    hydrate: bool,
    outcome: Result<Vec<HistoryEntry>>,
}

// Holds the loading flag up until dropped, however the send ends.
struct Loading<'a>(&'a watch::Sender<bool>);

impl<'a> Loading<'a> {
    fn enter(flag: &'a watch::Sender<bool>) -> Self {
        flag.send_replace(true);
        Self(flag)
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.0.send_replace(false);
    }
}

/// A chat session bound to one backend session id.
pub struct ChatSession {
    transport: Arc<dyn Transport>,
    session_id: SessionId,
    transcript: Transcript,
    store: HistoryStore,
    toggles: Toggles,
    loading: watch::Sender<bool>,
    refresh_tx: mpsc::UnboundedSender<Refresh>,
    refresh_rx: mpsc::UnboundedReceiver<Refresh>,
    outstanding: usize,
}

impl ChatSession {
    /// Creates a session with empty state.  Nothing is fetched until
    /// [`ChatSession::mount`].
    pub fn new(transport: Arc<dyn Transport>, session_id: SessionId) -> Self {
        let (loading, _) = watch::channel(false);
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        Self {
            transport,
            session_id,
            transcript: Transcript::new(),
            store: HistoryStore::new(),
            toggles: Toggles::new(),
            loading,
            refresh_tx,
            refresh_rx,
            outstanding: 0,
        }
    }

    /// Sets the initial presentation toggles.
    pub fn with_toggles(mut self, toggles: Toggles) -> Self {
        self.toggles = toggles;
        self
    }

    /// The session every request is scoped to.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// The rendered transcript.
    pub fn messages(&self) -> &[Message] {
        self.transcript.messages()
    }

    /// The round trips sent along with each chat request.
    pub fn history(&self) -> &[HistoryEntry] {
        self.store.history()
    }

    /// The last applied copy of the server's history.
    pub fn full_history(&self) -> &[HistoryEntry] {
        self.store.full_history()
    }

    /// What the history panel shows, or `None` while it is hidden.
    pub fn history_panel(&self) -> Option<&[HistoryEntry]> {
        self.toggles
            .show_history_panel()
            .then(|| self.store.full_history())
    }

    /// The presentation toggles.
    pub fn toggles(&self) -> &Toggles {
        &self.toggles
    }

    /// Shows or hides retrieved context under bot messages.
    pub fn set_show_context(&mut self, show: bool) {
        self.toggles.set_show_context(show);
    }

    /// Hides the history panel.
    pub fn close_history_panel(&mut self) {
        self.toggles.close_history_panel();
    }

    /// Returns true while a chat call is in flight.
    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Watches the loading flag; it is `true` exactly while a chat call is in
    /// flight.
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// Returns the number of background refreshes not yet applied.
    pub fn outstanding_refreshes(&self) -> usize {
        self.outstanding
    }

    /// Initial load: fetch the persisted history in the background.
    ///
    /// When the result lands it replaces the history mirror and, if the
    /// transcript is still empty, hydrates it.  A failure leaves everything
    /// as it was.  Must be called from within a Tokio runtime.
    pub fn mount(&mut self) {
        self.spawn_refresh(true);
    }

    /// Sends a query to the agent.
    ///
    /// The user message is shown before the call is made.  On success the
    /// reply is shown, the round trip is recorded and a background refresh
    /// is issued.  On failure [`CHAT_ERROR_TEXT`] is shown and the round trip
    /// is not recorded.  Blank queries are skipped.
    pub async fn send(&mut self, query: &str) -> SendOutcome {
        self.apply_background();
        if query.trim().is_empty() {
            return SendOutcome::Skipped;
        }

        self.transcript.append_user_message(query);
        let outcome = {
            let _loading = Loading::enter(&self.loading);
            let result = self
                .transport
                .send_chat(query, self.store.history(), &self.session_id)
                .await;
            match result {
                Ok(reply) => {
                    self.transcript
                        .append_bot_message(reply.response.clone(), reply.context.clone());
                    self.store
                        .append_round_trip(query, reply.response.clone());
                    SendOutcome::Replied(reply)
                }
                Err(err) => {
                    tracing::warn!(session = %self.session_id, "chat failed: {err}");
                    self.transcript.append_bot_message(CHAT_ERROR_TEXT, None);
                    SendOutcome::Failed(err)
                }
            }
        };

        if outcome.is_replied() {
            self.spawn_refresh(false);
        }
        outcome
    }

    /// Clears the conversation here and on the backend.
    ///
    /// Either everything is cleared or, if the backend refuses, nothing is
    /// and the error is returned for reporting.
    pub async fn clear(&mut self) -> Result<()> {
        self.apply_background();
        match self.transport.clear_history(&self.session_id).await {
            Ok(()) => {
                self.transcript.clear();
                self.store.clear();
                tracing::debug!(session = %self.session_id, "history cleared");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(session = %self.session_id, "failed to clear history: {err}");
                Err(err)
            }
        }
    }

    /// Fetches the persisted history and shows the history panel.
    ///
    /// Never touches the transcript.  On failure nothing changes and the
    /// error is returned.
    pub async fn open_history_panel(&mut self) -> Result<()> {
        self.apply_background();
        let ticket = self.store.issue_ticket();
        match self.transport.fetch_history(&self.session_id).await {
            Ok(entries) => {
                self.store.apply_fetch(ticket, entries);
                self.toggles.open_history_panel();
                Ok(())
            }
            Err(err) => {
                tracing::warn!(session = %self.session_id, "error loading history: {err}");
                Err(err)
            }
        }
    }

    /// Applies every background refresh that has already completed.
    pub fn apply_background(&mut self) {
        while let Ok(refresh) = self.refresh_rx.try_recv() {
            self.apply_refresh(refresh);
        }
    }

    /// Waits for the next background refresh and applies it.  Returns false
    /// if none is outstanding.
    pub async fn apply_next_background(&mut self) -> bool {
        if self.outstanding == 0 {
            return false;
        }
        match self.refresh_rx.recv().await {
            Some(refresh) => {
                self.apply_refresh(refresh);
                true
            }
            None => false,
        }
    }

    /// Waits for every outstanding background refresh and applies it.
    pub async fn settle(&mut self) {
        while self.apply_next_background().await {}
    }

    fn spawn_refresh(&mut self, hydrate: bool) {
        let ticket = self.store.issue_ticket();
        let transport = Arc::clone(&self.transport);
        let session_id = self.session_id.clone();
        let tx = self.refresh_tx.clone();
        self.outstanding += 1;
        tokio::spawn(async move {
            // A panicking fetch must still report, or `settle` never returns.
            let fetch = tokio::spawn(async move { transport.fetch_history(&session_id).await });
            let outcome = match fetch.await {
                Ok(outcome) => outcome,
                Err(err) => Err(Error::history_fetch(
                    format!("history refresh aborted: {err}"),
                    Cause::Request,
                    None,
                )),
            };
            // The session may be gone; then nobody wants the result.
            let _ = tx.send(Refresh {
                ticket,
                hydrate,
                outcome,
            });
        });
    }

    fn apply_refresh(&mut self, refresh: Refresh) {
        self.outstanding = self.outstanding.saturating_sub(1);
        let entries = match refresh.outcome {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(session = %self.session_id, "error loading history: {err}");
                return;
            }
        };
        if !self.store.apply_fetch(refresh.ticket, entries) {
            if !self.store.is_superseded(refresh.ticket) {
                tracing::debug!(session = %self.session_id, "discarding stale history refresh");
                return;
            }
            // A newer fetch from the same epoch already landed; hydrate from it.
            tracing::debug!(session = %self.session_id, "history refresh superseded");
        }
        if refresh.hydrate && self.transcript.hydrate_from_history(self.store.full_history()) {
            tracing::debug!(
                session = %self.session_id,
                messages = self.transcript.len(),
                "transcript hydrated from history"
            );
        }
    }
}
