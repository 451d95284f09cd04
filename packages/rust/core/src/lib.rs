//! Pipeline orchestration and the inference seam for linkprompt.
//!
//! This crate ties together fetching, text extraction, prompting, and the
//! durable result files into the resumable link-processing loop.

pub mod inference;
pub mod pipeline;
pub mod prompt;
