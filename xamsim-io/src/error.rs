//! I/O error types.

use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse error in a whole-document file.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON parse error on one line of a hit stream.
    #[error("invalid event on line {line}: {source}")]
    InvalidEvent {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] xamsim_core::Error),
}
