//! Error types for linkprompt.
//!
//! Library crates use [`LinkPromptError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all linkprompt operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkPromptError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching a page.
    #[error("network error: {0}")]
    Network(String),

    /// The inference backend could not produce a response.
    #[error("inference error: {0}")]
    Inference(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (rewound cursor, malformed input, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Snapshot serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The prompt file is empty or missing. Fatal for the whole pipeline.
    #[error("no prompts found in {path:?}")]
    NoPrompts { path: PathBuf },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LinkPromptError>;

impl LinkPromptError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
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

    /// Whether this error is the fatal empty-prompts condition.
    pub fn is_no_prompts(&self) -> bool {
        matches!(self, Self::NoPrompts { .. })
    }
}
