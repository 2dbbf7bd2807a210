//! Error types for the sync layer
//!
//! Provides error handling for:
//! - Remote store failures (retryable or permanent)
//! - Local store misuse (no active document, closed session)
//! - Configuration loading

use soullink_progression::ProgressionError;
use std::path::PathBuf;

/// Failure reported by a remote document store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Store temporarily unreachable
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    /// Store refused the request
    #[error("remote rejected request: {0}")]
    Rejected(String),

    /// Document could not be encoded
    #[error("encoding failed: {0}")]
    Encoding(String),
}

impl RemoteError {
    /// Check if retrying may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config at {path}: {source}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// TOML could not be parsed
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Main sync error type
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// No session is selected or the document is still loading
    #[error("no active document")]
    NoActiveDocument,

    /// The session changed while an operation was in flight
    #[error("session closed")]
    SessionClosed,

    /// Remote store error
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Mutation rejected by the progression rules
    #[error("rejected: {0}")]
    Rejected(#[from] ProgressionError),
}

impl SyncError {
    /// Check if the error is a rejected no-op mutation
    #[inline]
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Check if retrying may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Remote(err) if err.is_retryable())
    }
}

/// Result alias for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;
