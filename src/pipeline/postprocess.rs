//! Post-processing: deterministic cleanup of extracted page text.
//!
//! ## Why is post-processing necessary?
//!
//! Text reconstructed from a PDF text layer carries artefacts that are
//! *faithful* to the page but *unpleasant* in a `.txt` file:
//!
//! - Windows-style `\r\n` line endings from the producing application
//! - trailing whitespace where justified text ended short
//! - runs of blank lines where the page had vertical whitespace
//! - invisible Unicode (zero-width spaces, BOM, soft hyphens) injected by
//!   the original authoring tool
//!
//! This module applies cheap, deterministic string/regex rules that fix
//! those artefacts without touching content. Each rule is a pure function
//! (`&str → String`) with no shared state, independently testable.
//!
//! ## Rule Order
//!
//! Line endings are normalised before per-line trimming so `\r` never
//! counts as line content; blank-line collapsing runs after trimming so
//! whitespace-only lines collapse too; the final-newline pass runs last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to reconstructed page text.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF → LF)
/// 2. Trim trailing whitespace per line
/// 3. Collapse 3+ consecutive blank lines down to 2
/// 4. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, etc.)
/// 5. Ensure the text ends with exactly one newline
pub fn clean_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = remove_invisible_chars(&s);
    ensure_final_newline(&s)
}

/// Flatten all whitespace runs to single spaces.
///
/// The "normalise line breaks" option of the text operation: the page loses
/// its line structure and becomes one trimmed line. Applied per page before
/// assembly so page separators survive.
pub fn normalise_whitespace(input: &str) -> String {
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
    RE_WS.replace_all(input, " ").trim().to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 3: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

// ── Rule 4: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 5: Ensure text ends with single newline ─────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
