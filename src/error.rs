//! Error types for ragchat.
//!
//! Every call the transport makes to the backend fails with exactly one of
//! the four operation errors below.  Each carries a [`Cause`] describing
//! what went wrong underneath and, when there is one, the underlying error.

use std::error;
use std::fmt;
use std::io;
use std::sync::Arc;

/// What went wrong underneath a failed backend call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cause {
    /// The backend could not be reached.
    Connection,

    /// The request did not complete in time.
    Timeout,

    /// The backend answered with a non-success HTTP status.
    Status(u16),

    /// The response body could not be decoded.
    Decode,

    /// The request could not be built or sent for another reason.
    Request,

    /// A local file could not be read.
    Io,
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cause::Connection => write!(f, "connection failed"),
            Cause::Timeout => write!(f, "timed out"),
            Cause::Status(code) => write!(f, "HTTP {code}"),
            Cause::Decode => write!(f, "undecodable response"),
            Cause::Request => write!(f, "request failed"),
            Cause::Io => write!(f, "I/O failure"),
        }
    }
}

/// The main error type for ragchat.
#[derive(Clone, Debug)]
pub enum Error {
    /// Uploading a document for ingestion failed.
    Upload {
        /// Human-readable error message.
        message: String,
        /// What failed underneath.
        cause: Cause,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// Exchanging a chat message with the agent failed.
    Chat {
        /// Human-readable error message.
        message: String,
        /// What failed underneath.
        cause: Cause,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// Fetching the persisted session history failed.
    HistoryFetch {
        /// Human-readable error message.
        message: String,
        /// What failed underneath.
        cause: Cause,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// Clearing the persisted session history failed.
    Clear {
        /// Human-readable error message.
        message: String,
        /// What failed underneath.
        cause: Cause,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// I/O error outside a backend call.
    Io {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Arc<io::Error>,
    },

    /// Invalid configuration.
    Config {
        /// Human-readable error message.
        message: String,
    },
}

impl Error {
    /// Creates a new upload error.
    pub fn upload(
        message: impl Into<String>,
        cause: Cause,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Upload {
            message: message.into(),
            cause,
            source: source.map(Arc::from),
        }
    }

    /// Creates a new chat error.
    pub fn chat(
        message: impl Into<String>,
        cause: Cause,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Chat {
            message: message.into(),
            cause,
            source: source.map(Arc::from),
        }
    }

    /// Creates a new history fetch error.
    pub fn history_fetch(
        message: impl Into<String>,
        cause: Cause,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::HistoryFetch {
            message: message.into(),
            cause,
            source: source.map(Arc::from),
        }
    }

    /// Creates a new clear error.
    pub fn clear(
        message: impl Into<String>,
        cause: Cause,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Clear {
            message: message.into(),
            cause,
            source: source.map(Arc::from),
        }
    }

    /// Creates a new I/O error.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            message: message.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a new configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Returns true if this error came from an upload.
    pub fn is_upload(&self) -> bool {
        matches!(self, Error::Upload { .. })
    }

    /// Returns true if this error came from a chat exchange.
    pub fn is_chat(&self) -> bool {
        matches!(self, Error::Chat { .. })
    }

    /// Returns true if this error came from a history fetch.
    pub fn is_history_fetch(&self) -> bool {
        matches!(self, Error::HistoryFetch { .. })
    }

    /// Returns true if this error came from a history clear.
    pub fn is_clear(&self) -> bool {
        matches!(self, Error::Clear { .. })
    }

    /// Returns the underlying cause of a backend call failure.
    pub fn cause(&self) -> Option<Cause> {
        match self {
            Error::Upload { cause, .. }
            | Error::Chat { cause, .. }
            | Error::HistoryFetch { cause, .. }
            | Error::Clear { cause, .. } => Some(*cause),
            Error::Io { .. } => Some(Cause::Io),
            Error::Config { .. } => None,
        }
    }

    /// Returns the HTTP status the backend answered with, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self.cause() {
            Some(Cause::Status(code)) => Some(code),
            _ => None,
        }
    }

    /// Returns true if the backend could not be reached at all.
    pub fn is_connection(&self) -> bool {
        self.cause() == Some(Cause::Connection)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Upload { message, cause, .. } => {
                write!(f, "Upload error: {message} ({cause})")
            }
            Error::Chat { message, cause, .. } => {
                write!(f, "Chat error: {message} ({cause})")
            }
            Error::HistoryFetch { message, cause, .. } => {
                write!(f, "History fetch error: {message} ({cause})")
            }
            Error::Clear { message, cause, .. } => {
                write!(f, "Clear error: {message} ({cause})")
            }
            Error::Io { message, .. } => {
                write!(f, "I/O error: {message}")
            }
            Error::Config { message } => {
                write!(f, "Configuration error: {message}")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Upload { source, .. }
            | Error::Chat { source, .. }
            | Error::HistoryFetch { source, .. }
            | Error::Clear { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Io { source, .. } => Some(source.as_ref() as &(dyn error::Error + 'static)),
            Error::Config { .. } => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io(err.to_string(), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::config(format!("invalid URL: {err}"))
    }
}

/// A specialized Result type for ragchat operations.
pub type Result<T> = std::result::Result<T, Error>;
