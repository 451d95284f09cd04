//! Markup-to-plain-text extraction.
//!
//! A single left-to-right pass over the raw page: tags are dropped, the
//! bodies of `<script>` and `<style>` elements are dropped, and every closed
//! tag becomes at most one space so neighbouring words never fuse.
//!
//! Known limitations, kept on purpose:
//! - Tag names are matched case-sensitively. `<SCRIPT>` or `<Style>` is an
//!   ordinary tag and its body ends up in the output.
//! - A `<` that is never closed by `>` hides the rest of the document.
//! - Entities (`&amp;`) are not decoded and whitespace is not collapsed.

mod scan;

use tracing::{debug, instrument};

pub use scan::{Emit, ScanState, step};

/// Reduce raw markup to plain text. Total: never fails, for any input.
#[instrument(skip_all, fields(input_len = markup.len()))]
pub fn extract(markup: &str) -> String {
    let mut text = String::with_capacity(markup.len());
    let mut state = ScanState::default();

    for (i, ch) in markup.char_indices() {
        let end = i + ch.len_utf8();
        let (next, emit) = step(state, ch, &markup[..end], &markup[i..]);
        state = next;

        match emit {
            Emit::Nothing => {}
            Emit::Char(c) => text.push(c),
            Emit::Boundary => {
                if !text.is_empty() && !text.ends_with(' ') {
                    text.push(' ');
                }
            }
        }
    }

    if state.in_tag {
        debug!("input ended inside an unterminated tag");
    }
    debug!(output_len = text.len(), "extraction complete");

    text
}
