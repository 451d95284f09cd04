//! Core domain types for a pipeline run.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PromptResult
// ---------------------------------------------------------------------------

/// One prompt and the response the model produced for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptResult {
    /// The prompt line as read from the prompt file.
    pub prompt: String,
    /// Raw model output, or the backend's failure text.
    pub response: String,
}

impl PromptResult {
    pub fn new(prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response: response.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// LinkSnapshot
// ---------------------------------------------------------------------------

/// The `link_<n>.json` document: everything known about one link so far.
///
/// Rewritten in full after every prompt, so it never lags the in-memory
/// state by more than one result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSnapshot {
    /// The link as read from the link file.
    pub url: String,
    /// Extracted plain text; empty when the page could not be fetched.
    pub page_text: String,
    /// Results in prompt-file order.
    pub results: Vec<PromptResult>,
}

impl LinkSnapshot {
    /// A snapshot with text but no results yet.
    pub fn new(url: impl Into<String>, page_text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            page_text: page_text.into(),
            results: Vec::new(),
        }
    }

    /// The terminal snapshot for a page that could not be fetched.
    pub fn unavailable(url: impl Into<String>) -> Self {
        Self::new(url, String::new())
    }
}
