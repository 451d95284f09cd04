//! Result log, per-link snapshots, and raw page copies.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use linkprompt_shared::{LinkPromptError, LinkSnapshot, Result, RunPaths};

use crate::write_atomic;

/// Log line written in place of results when a page could not be fetched.
pub const UNAVAILABLE_MESSAGE: &str = "Webseite nicht vorhanden";

/// Separator appended to the log after a link's last prompt.
pub const END_OF_LINK: &str = "\n\n";

/// Log block for a link whose page could not be fetched.
///
/// `link_number` is 1-based.
pub fn unavailable_block(link_number: usize, url: &str) -> String {
    format!("Link {link_number}: {url}\n{UNAVAILABLE_MESSAGE}\n\n\n")
}

/// Log block for one completed prompt.
pub fn result_block(link_number: usize, url: &str, prompt: &str, response: &str) -> String {
    format!("Link {link_number}: {url}\nPrompt: {prompt}\nErgebnis: {response}\n\n")
}

/// Writes the two kinds of results a run produces.
///
/// The log only grows. Snapshots are replaced whole on every write.
#[derive(Debug, Clone)]
pub struct ResultSink {
    paths: RunPaths,
}

impl ResultSink {
    pub fn new(paths: RunPaths) -> Self {
        Self { paths }
    }

    pub fn log_path(&self) -> &Path {
        &self.paths.result_file
    }

    /// Snapshot location for a zero-based link index.
    pub fn snapshot_path(&self, link_index: usize) -> PathBuf {
        self.paths.snapshot_path(link_index)
    }

    /// Create the result log if it does not exist yet. Existing content is kept.
    pub fn ensure_log(&self) -> Result<()> {
        let path = self.log_path();
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map(drop)
            .map_err(|e| LinkPromptError::io(path, e))
    }

    /// Append a block of text to the result log.
    pub fn append_log(&self, text: &str) -> Result<()> {
        let path = self.log_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| LinkPromptError::io(path, e))?;

        file.write_all(text.as_bytes())
            .map_err(|e| LinkPromptError::io(path, e))?;
        file.flush().map_err(|e| LinkPromptError::io(path, e))
    }

    /// Replace the snapshot of one link with `snapshot`.
    #[instrument(skip_all, fields(link = link_index + 1, results = snapshot.results.len()))]
    pub fn write_snapshot(&self, link_index: usize, snapshot: &LinkSnapshot) -> Result<()> {
        let path = self.snapshot_path(link_index);
        let json = serde_json::to_string_pretty(snapshot).map_err(|e| {
            LinkPromptError::Serialization(format!("snapshot serialization failed: {e}"))
        })?;

        write_atomic(&path, json.as_bytes())?;
        debug!(path = %path.display(), "wrote snapshot");
        Ok(())
    }

    /// Store the fetched body of one link unchanged, as `page_<n>.html`.
    pub fn write_raw_page(&self, link_index: usize, body: &str) -> Result<()> {
        let path = self.paths.raw_page_path(link_index);
        write_atomic(&path, body.as_bytes())?;
        debug!(path = %path.display(), bytes = body.len(), "wrote raw page");
        Ok(())
    }

    /// Load a previously written snapshot, if any.
    #[cfg(test)]
    pub(crate) fn read_snapshot(&self, link_index: usize) -> Result<Option<LinkSnapshot>> {
        let path = self.snapshot_path(link_index);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LinkPromptError::io(&path, e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| LinkPromptError::validation(format!("invalid {}: {e}", path.display())))
    }
}
