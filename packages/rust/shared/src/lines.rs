//! Line-oriented input files (links, prompts).

use std::io::ErrorKind;
use std::path::Path;

use crate::error::{LinkPromptError, Result};

/// Split text into trimmed, non-empty lines.
pub fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Read a line-oriented file fresh from disk.
///
/// A file that does not exist yet reads as an empty list; any other I/O
/// failure is an error. Invalid UTF-8 is replaced rather than rejected.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(parse_lines(&String::from_utf8_lossy(&bytes))),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "input file missing, treating as empty");
            Ok(Vec::new())
        }
        Err(e) => Err(LinkPromptError::io(path, e)),
    }
}
