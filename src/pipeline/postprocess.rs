//! Post-processing: deterministic cleanup of model output before parsing.
//!
//! Even when told "output ONLY JSON" or "output ONLY DOT code", models
//! regularly wrap the answer in a ```json / ```dot fence, use CRLF line
//! endings, or leak zero-width characters. These rules undo exactly that and
//! nothing more: no prose is stripped, so an answer with commentary around
//! the payload still fails to parse and falls back to raw text.
//!
//! The cleaned string is only used for parsing and rendering; the raw text
//! shown to the user is never modified.
//!
//! ## Rule Order
//!
//! Invisible characters go first (a BOM before the fence would hide it),
//! then line endings (the fence regex expects `\n`), then the fence itself.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules, in order:
/// 1. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 2. Normalise line endings (CRLF → LF)
/// 3. Strip one outer code fence, whatever its language tag
/// 4. Trim surrounding whitespace
pub fn clean_for_parse(input: &str) -> String {
    let s = remove_invisible_chars(input);
    let s = normalise_line_endings(&s);
    let s = strip_code_fences(&s);
    s.trim().to_string()
}

// ── Rule 1: Remove invisible characters ──────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z0-9_+-]*[ \t]*\n(.*?)\n?```\s*$").unwrap());

fn strip_code_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── DOT sniffing ─────────────────────────────────────────────────────────────

static RE_LEADING_COMMENTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\s*(?://[^\n]*|#[^\n]*|(?s:/\*.*?\*/)))*").unwrap()
});

static RE_DOT_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*(?:strict\s+)?(?:di)?graph\b\s*(?:"(?:[^"\\]|\\.)*"|[^\s{]+)?\s*\{"#)
        .unwrap()
});

static RE_DOT_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\}\s*;?\s*$").unwrap());

/// Cheap structural check: a `graph`/`digraph` header opening a brace that is
/// closed at the end. Leading comments are skipped and any ID Graphviz would
/// take is accepted. Not a parser; Graphviz has the final word.
pub fn looks_like_dot(input: &str) -> bool {
    let s = input.trim();
    let body = RE_LEADING_COMMENTS
        .find(s)
        .map_or(s, |m| &s[m.end()..]);
    RE_DOT_HEADER.is_match(body) && RE_DOT_TAIL.is_match(body)
}
