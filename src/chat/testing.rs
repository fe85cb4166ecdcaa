//! A transport double that replays scripted replies and records every call.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::{oneshot, watch};

use crate::client::Transport;
use crate::error::{Cause, Error, Result};
use crate::types::{ChatReply, Document, HistoryEntry, SessionId};

/// A call the double received.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Upload(String),
    Chat {
        message: String,
        history: Vec<HistoryEntry>,
        session_id: SessionId,
    },
    FetchHistory(SessionId),
    ClearHistory(SessionId),
}

enum HistoryReply {
    Ready(Result<Vec<HistoryEntry>>),
    Gated(oneshot::Receiver<Result<Vec<HistoryEntry>>>),
    Panic,
}

/// Replies are consumed in call order.  With nothing scripted, chat fails
/// with a connection error and everything else succeeds with empty results.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    chat: Mutex<VecDeque<Result<ChatReply>>>,
    history: Mutex<VecDeque<HistoryReply>>,
    clear: Mutex<VecDeque<Result<()>>>,
    upload: Mutex<VecDeque<Result<()>>>,
    calls: Mutex<Vec<Call>>,
    loading: Mutex<Option<watch::Receiver<bool>>>,
    loading_seen: Mutex<Vec<bool>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(&self, response: &str, context: Option<&str>) {
        self.chat
            .lock()
            .unwrap()
            .push_back(Ok(ChatReply::new(response, context.map(String::from))));
    }

    pub(crate) fn fail_chat(&self) {
        self.chat
            .lock()
            .unwrap()
            .push_back(Err(Error::chat("connection refused", Cause::Connection, None)));
    }

    pub(crate) fn history(&self, entries: Vec<HistoryEntry>) {
        self.history
            .lock()
            .unwrap()
            .push_back(HistoryReply::Ready(Ok(entries)));
    }

    pub(crate) fn fail_history(&self) {
        self.history
            .lock()
            .unwrap()
            .push_back(HistoryReply::Ready(Err(Error::history_fetch(
                "connection refused",
                Cause::Connection,
                None,
            ))));
    }

    /// The next fetch blocks until the returned sender fires.
    pub(crate) fn gated_history(&self) -> oneshot::Sender<Result<Vec<HistoryEntry>>> {
        let (tx, rx) = oneshot::channel();
        self.history
            .lock()
            .unwrap()
            .push_back(HistoryReply::Gated(rx));
        tx
    }

    /// The next fetch panics instead of returning.
    pub(crate) fn panic_history(&self) {
        self.history.lock().unwrap().push_back(HistoryReply::Panic);
    }

    pub(crate) fn fail_clear(&self) {
        self.clear
            .lock()
            .unwrap()
            .push_back(Err(Error::clear("internal error", Cause::Status(500), None)));
    }

    pub(crate) fn fail_upload(&self) {
        self.upload
            .lock()
            .unwrap()
            .push_back(Err(Error::upload("ingestion failed", Cause::Status(500), None)));
    }

    /// Record the loading flag each time `send_chat` is entered.
    pub(crate) fn observe_loading(&self, loading: watch::Receiver<bool>) {
        *self.loading.lock().unwrap() = Some(loading);
    }

    pub(crate) fn loading_seen(&self) -> Vec<bool> {
        self.loading_seen.lock().unwrap().clone()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::FetchHistory(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn upload(&self, document: &Document) -> Result<()> {
        self.record(Call::Upload(document.file_name.clone()));
        self.upload.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn send_chat(
        &self,
        message: &str,
        history: &[HistoryEntry],
        session_id: &SessionId,
    ) -> Result<ChatReply> {
        self.record(Call::Chat {
            message: message.to_string(),
            history: history.to_vec(),
            session_id: session_id.clone(),
        });
        if let Some(loading) = self.loading.lock().unwrap().as_ref() {
            self.loading_seen.lock().unwrap().push(*loading.borrow());
        }
        self.chat.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(Error::chat(
                "nothing scripted",
                Cause::Connection,
                None,
            ))
        })
    }

    async fn fetch_history(&self, session_id: &SessionId) -> Result<Vec<HistoryEntry>> {
        self.record(Call::FetchHistory(session_id.clone()));
        let reply = self.history.lock().unwrap().pop_front();
        match reply {
            Some(HistoryReply::Ready(result)) => result,
            Some(HistoryReply::Gated(rx)) => rx.await.unwrap_or_else(|_| {
                Err(Error::history_fetch("gate dropped", Cause::Request, None))
            }),
            Some(HistoryReply::Panic) => panic!("history store exploded"),
            None => Ok(Vec::new()),
        }
    }

    async fn clear_history(&self, session_id: &SessionId) -> Result<()> {
        self.record(Call::ClearHistory(session_id.clone()));
        self.clear.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}
