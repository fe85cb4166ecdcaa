use std::error;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, Response};
use serde::Deserialize;
use url::Url;

use crate::error::{Cause, Error, Result};
use crate::types::{ChatReply, ChatRequest, Document, HistoryEntry, HistoryResponse, SessionId};

/// Where the backend listens unless told otherwise.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8001";

const UPLOAD_PATH: &str = "upload";
const CHAT_PATH: &str = "api/chat";
const HISTORY_PATH: &str = "api/history";

/// Which backend call failed; picks the error variant.
#[derive(Clone, Copy, Debug)]
enum Operation {
    Upload,
    Chat,
    HistoryFetch,
    Clear,
}

impl Operation {
    fn error(
        self,
        message: String,
        cause: Cause,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Error {
        match self {
            Operation::Upload => Error::upload(message, cause, source),
            Operation::Chat => Error::chat(message, cause, source),
            Operation::HistoryFetch => Error::history_fetch(message, cause, source),
            Operation::Clear => Error::clear(message, cause, source),
        }
    }
}

/// The four calls the chat front-end makes to the backend.
///
/// Each call is a single exchange.  Nothing here retries; a failure is the
/// final outcome of that call.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Hand a document to the backend for ingestion into the knowledge base.
    async fn upload(&self, document: &Document) -> Result<()>;

    /// Send the current message together with every earlier round trip.
    async fn send_chat(
        &self,
        message: &str,
        history: &[HistoryEntry],
        session_id: &SessionId,
    ) -> Result<ChatReply>;

    /// Fetch everything the backend has persisted for the session.
    async fn fetch_history(&self, session_id: &SessionId) -> Result<Vec<HistoryEntry>>;

    /// Drop everything the backend has persisted for the session.
    async fn clear_history(&self, session_id: &SessionId) -> Result<()>;
}

/// HTTP client for the retrieval-augmented chat backend.
#[derive(Debug, Clone)]
pub struct Backend {
    client: ReqwestClient,
    base_url: Url,
    timeout: Option<Duration>,
}

impl Backend {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a client with custom settings.
    ///
    /// Without a timeout a hung call never completes.
    pub fn with_options(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config(format!("{base_url} cannot be a base URL")));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// The normalized base URL every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The per-request timeout, if one was configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> Url {
        // The base always ends in '/', so joining a relative path only appends.
        let mut url = self.base_url.clone();
        let joined = format!("{}{}", url.path(), path);
        url.set_path(&joined);
        url
    }

    fn history_url(&self, session_id: &SessionId) -> Url {
        let mut url = self.endpoint(HISTORY_PATH);
        url.query_pairs_mut()
            .append_pair("session_id", session_id.as_str());
        url
    }

    /// Convert a reqwest failure into the operation's error.
    fn request_error(op: Operation, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            op.error(
                format!("Request timed out: {}", e),
                Cause::Timeout,
                Some(Box::new(e)),
            )
        } else if e.is_connect() {
            op.error(
                format!("Connection error: {}", e),
                Cause::Connection,
                Some(Box::new(e)),
            )
        } else if e.is_decode() {
            op.error(
                format!("Failed to parse response: {}", e),
                Cause::Decode,
                Some(Box::new(e)),
            )
        } else {
            op.error(
                format!("Request failed: {}", e),
                Cause::Request,
                Some(Box::new(e)),
            )
        }
    }

    /// Turn a non-success response into the operation's error.
    async fn process_error_response(op: Operation, response: Response) -> Error {
        let status = response.status().as_u16();

        #[derive(Deserialize)]
        struct ErrorResponse {
            detail: Option<serde_json::Value>,
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return op.error(
                    format!("Failed to read error response: {}", e),
                    Cause::Status(status),
                    Some(Box::new(e)),
                );
            }
        };

        let message = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .and_then(|e| e.detail)
            .map(|detail| match detail {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or(body);
        op.error(message, Cause::Status(status), None)
    }

    async fn execute(op: Operation, request: reqwest::RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Self::request_error(op, e))?;
        if !response.status().is_success() {
            return Err(Self::process_error_response(op, response).await);
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl Transport for Backend {
    async fn upload(&self, document: &Document) -> Result<()> {
        let url = self.endpoint(UPLOAD_PATH);
        tracing::debug!(
            file = %document.file_name,
            bytes = document.bytes.len(),
            "uploading document"
        );
        let part = Part::bytes(document.bytes.clone()).file_name(document.file_name.clone());
        let form = Form::new().part("file", part);
        Self::execute(Operation::Upload, self.client.post(url).multipart(form)).await?;
        Ok(())
    }

    async fn send_chat(
        &self,
        message: &str,
        history: &[HistoryEntry],
        session_id: &SessionId,
    ) -> Result<ChatReply> {
        let url = self.endpoint(CHAT_PATH);
        let body = ChatRequest::new(message, history, session_id);
        let response = Self::execute(Operation::Chat, self.client.post(url).json(&body)).await?;
        response
            .json::<ChatReply>()
            .await
            .map_err(|e| Self::request_error(Operation::Chat, e))
    }

    async fn fetch_history(&self, session_id: &SessionId) -> Result<Vec<HistoryEntry>> {
        let url = self.history_url(session_id);
        let response = Self::execute(Operation::HistoryFetch, self.client.get(url)).await?;
        let body = response
            .json::<HistoryResponse>()
            .await
            .map_err(|e| Self::request_error(Operation::HistoryFetch, e))?;
        Ok(body.history)
    }

    async fn clear_history(&self, session_id: &SessionId) -> Result<()> {
        let url = self.history_url(session_id);
        Self::execute(Operation::Clear, self.client.delete(url)).await?;
        Ok(())
    }
}
