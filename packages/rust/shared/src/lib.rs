//! Shared types, error model, and configuration for linkprompt.
//!
//! This crate is the foundation depended on by all other linkprompt crates.
//! It provides:
//! - [`LinkPromptError`] — the unified error type
//! - Domain types ([`LinkSnapshot`], [`PromptResult`])
//! - Configuration ([`AppConfig`], [`RunPaths`], config loading)
//! - Line-oriented input loading ([`read_lines`])

pub mod config;
pub mod error;
pub mod lines;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CONFIG_FILE_NAME, FetchSettings, InferenceBackend, InferenceSettings, LogFormat,
    LoggingSettings, PipelineSettings, RunPaths, load_config_for, load_config_from,
};
pub use error::{LinkPromptError, Result};
pub use lines::{parse_lines, read_lines};
pub use types::{LinkSnapshot, PromptResult};
