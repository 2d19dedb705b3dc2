//! Error types for xamsim-core.

use thiserror::Error;

/// Result type alias for xamsim operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for xamsim operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Threshold outside the accepted range (must be finite and non-negative).
    #[error("invalid {kind} threshold for '{collection}': {value}")]
    InvalidThreshold {
        collection: String,
        kind: ThresholdKind,
        value: f64,
    },

    /// A collection name was registered twice.
    #[error("duplicate collection name: {0}")]
    DuplicateCollection(String),

    /// A collection name that was never registered.
    #[error("unknown collection: {0}")]
    UnknownCollection(String),
}

/// Which half of a threshold pair an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdKind {
    /// Spatial distance threshold (mm).
    Spatial,
    /// Time difference threshold (ns).
    Time,
}

impl std::fmt::Display for ThresholdKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spatial => f.write_str("spatial"),
            Self::Time => f.write_str("time"),
        }
    }
}
