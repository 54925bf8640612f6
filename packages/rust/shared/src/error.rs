//! Error types for harvestdoc.
//!
//! Library crates use [`HarvestError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for reporting.

use std::path::PathBuf;

/// Top-level error type for all harvestdoc operations.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Connection, TLS or timeout failure while talking to the remote API.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote API answered with a non-200 status.
    #[error("client: {status}")]
    UnexpectedStatus { status: String },

    /// The catalog payload is not a valid JSON array of concepts.
    #[error("json: {message}")]
    Decode { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The output sink rejected a write.
    #[error("write error: {0}")]
    Write(String),

    /// A concept with fields has no category to report in its rows.
    #[error("concept {concept:?} has fields but no category")]
    MissingCategory { concept: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, HarvestError>;

impl HarvestError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a decode error from any displayable message.
    pub fn decode(msg: impl ToString) -> Self {
        Self::Decode {
            message: msg.to_string(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the error came from fetching or decoding the catalog,
    /// as opposed to writing the export.
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::UnexpectedStatus { .. } | Self::Decode { .. } | Self::Io { .. }
        )
    }
}
