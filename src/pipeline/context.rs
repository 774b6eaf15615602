//! Context building: one bounded text blob shared by all four prompts.
//!
//! Truncation counts Unicode scalar values, not bytes, so a cut never lands
//! inside a multi-byte character. It is silent towards the model; the run
//! records `truncated` in its stats for callers that want to tell the user.

use crate::config::Capabilities;
use crate::pipeline::extract::{self, ExtractionBackend};
use crate::pipeline::input::RawInput;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Characters shown by [`BoundedContext::preview`] by default.
pub const DEFAULT_PREVIEW_CHARS: usize = 3000;

/// Where the context text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextSource {
    PastedText,
    Pdf {
        backend: Option<ExtractionBackend>,
    },
    None,
}

/// The text every prompt embeds. `text.chars().count() <= max_chars` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundedContext {
    text: String,
    source: ContextSource,
    /// Length of the selected text before truncation, in chars.
    original_chars: usize,
    truncated: bool,
}

impl BoundedContext {
    /// Bound `text` to its first `max_chars` characters.
    pub fn new(text: &str, max_chars: usize, source: ContextSource) -> Self {
        let original_chars = text.chars().count();
        let truncated = original_chars > max_chars;
        let text = if truncated {
            truncate_chars(text, max_chars).to_string()
        } else {
            text.to_string()
        };
        Self {
            text,
            source,
            original_chars,
            truncated,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> ContextSource {
        self.source
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn original_chars(&self) -> usize {
        self.original_chars
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// First `limit` characters, with `...` appended when there is more.
    pub fn preview(&self, limit: usize) -> String {
        let head = truncate_chars(&self.text, limit);
        if head.len() < self.text.len() {
            format!("{head}...")
        } else {
            head.to_string()
        }
    }
}

/// Longest prefix of `s` with at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

/// Turn the selected input into the bounded context.
///
/// PDF input goes through the extractor; pasted text is used as given
/// (already trimmed by input resolution).
pub async fn build_context(raw: RawInput, max_chars: usize, caps: Capabilities) -> BoundedContext {
    let (text, source) = match raw {
        RawInput::Text(text) => (text, ContextSource::PastedText),
        RawInput::Pdf(bytes) => {
            debug!("Extracting text from {} PDF bytes", bytes.len());
            let extraction = extract::extract_text(bytes, caps).await;
            (
                extraction.text,
                ContextSource::Pdf {
                    backend: extraction.backend,
                },
            )
        }
        RawInput::Empty => (String::new(), ContextSource::None),
    };

    let context = BoundedContext::new(&text, max_chars, source);
    if context.is_truncated() {
        info!(
            "Context truncated: {} → {} chars",
            context.original_chars(),
            context.char_len()
        );
    } else {
        debug!("Context: {} chars", context.char_len());
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_text_is_cut_to_exact_prefix() {
        let text = "abcdefghij".repeat(7_000);
        let ctx = BoundedContext::new(&text, 60_000, ContextSource::PastedText);
        assert_eq!(ctx.char_len(), 60_000);
        assert_eq!(ctx.as_str(), &text[..60_000]);
        assert!(ctx.is_truncated());
        assert_eq!(ctx.original_chars(), 70_000);
    }

    #[test]
    fn short_text_is_untouched() {
        let ctx = BoundedContext::new("short", 60_000, ContextSource::PastedText);
        assert_eq!(ctx.as_str(), "short");
        assert!(!ctx.is_truncated());
    }

    #[test]
    fn exact_length_is_not_truncated() {
        let ctx = BoundedContext::new("abc", 3, ContextSource::PastedText);
        assert_eq!(ctx.as_str(), "abc");
        assert!(!ctx.is_truncated());
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let ctx = BoundedContext::new("ééééé", 3, ContextSource::PastedText);
        assert_eq!(ctx.as_str(), "ééé");
        assert_eq!(ctx.char_len(), 3);
    }

    #[test]
    fn preview_adds_ellipsis_only_when_cut() {
        let ctx = BoundedContext::new("hello world", 100, ContextSource::PastedText);
        assert_eq!(ctx.preview(5), "hello...");
        assert_eq!(ctx.preview(11), "hello world");
        assert_eq!(ctx.preview(DEFAULT_PREVIEW_CHARS), "hello world");
    }

    #[tokio::test]
    async fn pasted_text_source() {
        let ctx = build_context(
            RawInput::Text("Photosynthesis".into()),
            60_000,
            Capabilities::none(),
        )
        .await;
        assert_eq!(ctx.as_str(), "Photosynthesis");
        assert_eq!(ctx.source(), ContextSource::PastedText);
    }

    #[tokio::test]
    async fn invalid_pdf_gives_empty_context() {
        let ctx = build_context(
            RawInput::Pdf(b"not a pdf".to_vec()),
            60_000,
            Capabilities::pure_rust(),
        )
        .await;
        assert!(ctx.is_empty());
        assert_eq!(ctx.source(), ContextSource::Pdf { backend: None });
    }

    #[tokio::test]
    async fn empty_input_gives_empty_context() {
        let ctx = build_context(RawInput::Empty, 60_000, Capabilities::none()).await;
        assert!(ctx.is_empty());
        assert_eq!(ctx.source(), ContextSource::None);
    }
}
