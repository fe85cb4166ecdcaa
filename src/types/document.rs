use utf8path::Path;

use crate::error::{Cause, Error, Result};

/// File extensions the backend knows how to ingest.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "txt"];

/// A document read from disk and ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// The file name reported to the backend.
    pub file_name: String,

    /// The raw file contents.
    pub bytes: Vec<u8>,
}

impl Document {
    /// Create a document from in-memory contents.
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Returns true if the path names a file the backend can ingest.
    pub fn is_accepted(path: &Path<'_>) -> bool {
        std::path::Path::new(path.as_str())
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                ACCEPTED_EXTENSIONS
                    .iter()
                    .any(|accepted| ext.eq_ignore_ascii_case(accepted))
            })
            .unwrap_or(false)
    }

    /// Read a document from disk.
    ///
    /// A file that cannot be read fails the upload it was meant for.
    pub async fn read(path: &Path<'_>) -> Result<Self> {
        let file_name = file_name_of(path)?;
        let bytes = tokio::fs::read(path.as_str()).await.map_err(|err| {
            Error::upload(
                format!("failed to read {path}"),
                Cause::Io,
                Some(Box::new(err)),
            )
        })?;
        Ok(Self { file_name, bytes })
    }
}

fn file_name_of(path: &Path<'_>) -> Result<String> {
    std::path::Path::new(path.as_str())
        .file_name()
        .and_then(|name| name.to_str())
        .map(String::from)
        .ok_or_else(|| Error::upload(format!("{path} does not name a file"), Cause::Io, None))
}

/// A path the user picked for upload, already checked against
/// [`ACCEPTED_EXTENSIONS`].
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPath(Path<'static>);

impl DocumentPath {
    /// Accepts the path if its extension is one the backend ingests.
    pub fn new(path: Path<'_>) -> Option<Self> {
        if Document::is_accepted(&path) {
            Some(Self(path.into_owned()))
        } else {
            None
        }
    }

    /// The checked path.
    pub fn as_path(&self) -> &Path<'static> {
        &self.0
    }
}
