//! The per-character transition function of the markup scanner.

const STYLE_OPENERS: [&str; 2] = ["<style ", "<style>"];
const SCRIPT_OPENERS: [&str; 2] = ["<script ", "<script>"];
const STYLE_CLOSER: &str = "</style>";
const SCRIPT_CLOSER: &str = "</script>";

/// Scanner flags. Script and style are tracked apart from `in_tag` because
/// their bodies, not just their tags, are dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanState {
    pub in_tag: bool,
    pub in_script: bool,
    pub in_style: bool,
}

impl ScanState {
    /// Plain characters are only copied through when no flag is set.
    pub fn is_visible(&self) -> bool {
        !self.in_tag && !self.in_script && !self.in_style
    }
}

/// What a single step contributes to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    Nothing,
    Char(char),
    /// A tag just closed: append one space unless the output is empty or
    /// already ends in a space.
    Boundary,
}

/// Advance the scanner by one character.
///
/// `seen` is the input up to and including `ch`; `rest` is the input
/// starting at `ch`. Both are only inspected at fixed offsets.
pub fn step(state: ScanState, ch: char, seen: &str, rest: &str) -> (ScanState, Emit) {
    let mut next = state;

    match ch {
        '<' => {
            next.in_tag = true;
            if STYLE_OPENERS.iter().any(|o| rest.starts_with(o)) {
                next.in_style = true;
            } else if SCRIPT_OPENERS.iter().any(|o| rest.starts_with(o)) {
                next.in_script = true;
            }
            (next, Emit::Nothing)
        }
        '>' if state.in_tag => {
            next.in_tag = false;
            if seen.ends_with(STYLE_CLOSER) {
                next.in_style = false;
            } else if seen.ends_with(SCRIPT_CLOSER) {
                next.in_script = false;
            }
            (next, Emit::Boundary)
        }
        _ if state.is_visible() => (next, Emit::Char(ch)),
        _ => (next, Emit::Nothing),
    }
}
