//! Error types for archive set operations

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for archive set operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for archive set operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The engine could not open an archive (missing file, bad format, wrong version)
    #[error("Could not open archive {}: {reason}", path.display())]
    Open {
        /// Path that was passed to the engine
        path: PathBuf,
        /// Engine supplied reason
        reason: String,
    },

    /// Name not present in any attached archive
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// A seek would have moved the cursor before the start of the entry
    #[error("Could not seek within file: resulting position {position} is negative")]
    NegativeSeek {
        /// The rejected position
        position: i64,
    },

    /// Operation attempted after the archive set or handle was closed
    #[error("Archive set is closed")]
    Closed,

    /// Metadata field the engine cannot provide
    #[error("Unsupported file information: {0}")]
    Unsupported(&'static str),

    /// An archive id that does not belong to this set
    #[error("Unknown archive id: {0}")]
    UnknownArchive(usize),

    /// A name the engine cannot represent (e.g. interior NUL byte)
    #[error("Invalid file name: {0:?}")]
    InvalidName(String),

    /// Any other failure reported by the archive engine
    #[error("{operation} failed: {message}")]
    Engine {
        /// Engine operation that failed
        operation: &'static str,
        /// Engine supplied detail
        message: String,
    },
}

impl Error {
    /// Create a new Open error
    pub fn open<P: Into<PathBuf>, S: Into<String>>(path: P, reason: S) -> Self {
        Error::Open {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new Engine error
    pub fn engine<S: Into<String>>(operation: &'static str, message: S) -> Self {
        Error::Engine {
            operation,
            message: message.into(),
        }
    }

    /// Check if this error means a name was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::FileNotFound(_))
    }
}
