//! Error types for Atlas.
//!
//! Library crates use [`AtlasError`] via `thiserror`.
//! The CLI app wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Atlas operations.
#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error during caption fetch or API calls.
    #[error("network error: {0}")]
    Network(String),

    /// Transcript retrieval error (no captions, disabled, bad video id).
    #[error("transcript error: {message}")]
    Transcript { message: String },

    /// Input parsing error (video URL, caption payload, stage files).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// LLM agent error (API, or response shape).
    #[error("agent error: {0}")]
    Agent(String),

    /// Notion publishing error.
    #[error("publish error: {0}")]
    Publish(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (schema mismatch, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AtlasError>;

impl AtlasError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a transcript error from any displayable message.
    pub fn transcript(msg: impl Into<String>) -> Self {
        Self::Transcript {
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

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
