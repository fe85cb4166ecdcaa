//! Document upload into the backend's knowledge base.

use tokio::sync::watch;
use utf8path::Path;

use crate::client::Transport;
use crate::types::{Document, DocumentPath};

/// Where the most recent upload stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadStatus {
    /// Nothing uploaded yet.
    #[default]
    Idle,

    /// The backend is ingesting the document.
    Ingesting,

    /// The document was added to the knowledge base.
    Succeeded,

    /// The upload failed.
    Failed,
}

impl UploadStatus {
    /// The line shown to the user for this status.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            UploadStatus::Idle => None,
            UploadStatus::Ingesting => Some("Ingesting document... please wait."),
            UploadStatus::Succeeded => Some("Success! Document added to knowledge base."),
            UploadStatus::Failed => Some("Error uploading file."),
        }
    }

    /// Returns true if this status reports a failure.
    pub fn is_error(&self) -> bool {
        matches!(self, UploadStatus::Failed)
    }
}

/// Tracks the selected document and the state of its upload.
pub struct Uploader {
    selected: Option<DocumentPath>,
    status: watch::Sender<UploadStatus>,
    on_complete: Option<Box<dyn FnMut() + Send>>,
}

impl Uploader {
    /// Creates an uploader with nothing selected.
    pub fn new() -> Self {
        let (status, _) = watch::channel(UploadStatus::Idle);
        Self {
            selected: None,
            status,
            on_complete: None,
        }
    }

    /// Runs `callback` after every successful upload.
    pub fn with_on_complete(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Selects a document for the next upload.
    ///
    /// Files the backend cannot ingest are not selectable; returns whether
    /// the selection took.
    pub fn select(&mut self, path: Path<'_>) -> bool {
        match DocumentPath::new(path) {
            Some(path) => {
                self.selected = Some(path);
                true
            }
            None => false,
        }
    }

    /// The currently selected document.
    pub fn selected(&self) -> Option<&DocumentPath> {
        self.selected.as_ref()
    }

    /// The current status.
    pub fn status(&self) -> UploadStatus {
        *self.status.borrow()
    }

    /// Returns true while an upload is in flight.
    pub fn is_uploading(&self) -> bool {
        self.status() == UploadStatus::Ingesting
    }

    /// Watches status changes, including `Ingesting` while in flight.
    pub fn subscribe(&self) -> watch::Receiver<UploadStatus> {
        self.status.subscribe()
    }

    /// Uploads the selected document.
    ///
    /// Returns `None` without touching anything when no document is selected
    /// or an upload is already running.  Failures are reported through the
    /// returned status, never as an error.
    pub async fn upload(&mut self, transport: &dyn Transport) -> Option<UploadStatus> {
        if self.is_uploading() {
            return None;
        }
        let path = self.selected.clone()?;
        self.status.send_replace(UploadStatus::Ingesting);

        let outcome = match Document::read(path.as_path()).await {
            Ok(document) => transport.upload(&document).await,
            Err(err) => Err(err),
        };
        let status = match outcome {
            Ok(()) => {
                tracing::info!(path = %path.as_path(), "document ingested");
                if let Some(callback) = self.on_complete.as_mut() {
                    callback();
                }
                UploadStatus::Succeeded
            }
            Err(err) => {
                tracing::warn!(path = %path.as_path(), "upload failed: {err}");
                UploadStatus::Failed
            }
        };
        self.status.send_replace(status);
        Some(status)
    }
}

impl Default for Uploader {
    fn default() -> Self {
        Self::new()
    }
}
