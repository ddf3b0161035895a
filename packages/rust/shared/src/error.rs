//! Error types for the interview prep engine.
//!
//! Library crates use [`InterviewPrepError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all research operations.
#[derive(Debug, thiserror::Error)]
pub enum InterviewPrepError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The backing store is unreachable or the gateway is disconnected.
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// A query or statement against a connected store failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// One data source failed to produce a payload.
    #[error("source `{source_name}` failed: {message}")]
    SourceFetch {
        source_name: String,
        message: String,
    },

    /// Language model call failed (transport, quota, or unusable content).
    #[error("model call error: {0}")]
    ModelCall(String),

    /// An external call exceeded its time budget.
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    /// Serialization or content parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid input (empty company name, zero preparation days, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, InterviewPrepError>;

impl InterviewPrepError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a source fetch error attributed to `source_name`.
    pub fn source_fetch(source_name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::SourceFetch {
            source_name: source_name.into(),
            message: msg.into(),
        }
    }

    /// Create a timeout error for the named operation.
    pub fn timeout(operation: impl Into<String>, secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            secs,
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the store could not be reached at all.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}
