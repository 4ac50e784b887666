//! Post-processing: deterministic cleanup of model-extracted text.
//!
//! ## Why is post-processing necessary?
//!
//! Even with a prompt that demands raw text only, vision models occasionally
//! introduce artefacts:
//!
//! - Wrapping the whole answer in ` ``` ` fences despite the instruction
//! - Windows-style `\r\n` line endings
//! - Trailing whitespace and runs of blank lines between paragraphs
//! - Invisible Unicode (zero-width spaces, BOM) copied from nowhere
//!
//! This module applies a handful of cheap, deterministic rules that remove
//! model quirks without touching content. Keeping them here rather than in the
//! prompt means the prompt stays focused on *what to extract*, not on
//! formatting edge-cases. Each rule is a pure `&str → String` function and is
//! independently testable.
//!
//! Rules must run in this order: strip fences before anything line-based so
//! the fence regex sees the raw shape, normalise line endings before trimming,
//! and trim outer whitespace last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to raw model output.
///
/// Rules (applied in order):
/// 1. Strip an outer code fence wrapping the whole output
/// 2. Normalise line endings (CRLF → LF)
/// 3. Strip invisible Unicode (zero-width spaces, BOM, word joiners)
/// 4. Trim trailing whitespace per line
/// 5. Collapse runs of blank lines to a single blank line
/// 6. Trim leading/trailing blank space from the whole text
pub fn clean_extracted_text(input: &str) -> String {
    let s = strip_outer_fences(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

// ── Rule 1: Strip an outer code fence ────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\n(.*)\n```\s*$").unwrap());

fn strip_outer_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Strip invisible Unicode ──────────────────────────────────────────

const INVISIBLE_CHARS: [char; 5] = [
    '\u{200B}', // zero-width space
    '\u{FEFF}', // BOM
    '\u{200C}', // zero-width non-joiner
    '\u{200D}', // zero-width joiner
    '\u{2060}', // word joiner
];

fn remove_invisible_chars(input: &str) -> String {
    input.chars().filter(|c| !INVISIBLE_CHARS.contains(c)).collect()
}

// ── Rule 4: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 5: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}
