//! Durable progress cursor.

use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, warn};

use linkprompt_shared::{LinkPromptError, Result};

use crate::write_atomic;

/// Index of the next unprocessed link, persisted as a plain integer.
///
/// The stored value only ever grows. A crash after a link's outputs are
/// written but before [`advance`](Self::advance) means that link is
/// processed again on the next start.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    path: PathBuf,
}

impl ProgressTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// The persisted cursor, or `0` on a first run.
    ///
    /// Empty or unparsable content also reads as `0`.
    pub fn read(&self) -> Result<usize> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(LinkPromptError::io(&self.path, e)),
        };

        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(0);
        }

        match trimmed.parse::<usize>() {
            Ok(cursor) => Ok(cursor),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    content = trimmed,
                    error = %e,
                    "unreadable progress file, starting from 0"
                );
                Ok(0)
            }
        }
    }

    /// Persist `next_index` as the new cursor.
    ///
    /// Refuses to move the cursor backwards.
    pub fn advance(&self, next_index: usize) -> Result<()> {
        let current = self.read()?;
        if next_index < current {
            return Err(LinkPromptError::validation(format!(
                "progress cursor cannot move backwards (from {current} to {next_index})"
            )));
        }

        write_atomic(&self.path, next_index.to_string().as_bytes())?;
        debug!(cursor = next_index, "progress advanced");
        Ok(())
    }
}
