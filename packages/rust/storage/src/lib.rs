//! Durable state of a pipeline run, kept in plain files.
//!
//! - [`ProgressTracker`] — the cursor file: index of the next unprocessed link
//! - [`ResultSink`] — the append-only result log, the per-link JSON snapshots,
//!   and the optional raw page copies
//!
//! **Write rules:**
//! - No file handle outlives a call; every write is flushed before returning.
//! - Whole-file replacements (cursor, snapshots, raw pages) go through a
//!   temp file and a rename, so readers only ever see a complete old or
//!   complete new version.
//! - The process is the only writer. Parallel link processing would need
//!   both types to serialize writes per link index.

mod progress;
mod sink;

use std::io::Write;
use std::path::Path;

use linkprompt_shared::{LinkPromptError, Result};

pub use progress::ProgressTracker;
pub use sink::{END_OF_LINK, ResultSink, UNAVAILABLE_MESSAGE, result_block, unavailable_block};

/// Replace `target` with `content` via a sibling temp file and a rename.
pub(crate) fn write_atomic(target: &Path, content: &[u8]) -> Result<()> {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = target.with_file_name(format!(".{file_name}.tmp"));

    {
        let mut file = std::fs::File::create(&temp).map_err(|e| LinkPromptError::io(&temp, e))?;
        file.write_all(content)
            .map_err(|e| LinkPromptError::io(&temp, e))?;
        file.sync_all().map_err(|e| LinkPromptError::io(&temp, e))?;
    }

    std::fs::rename(&temp, target).map_err(|e| LinkPromptError::io(target, e))
}
