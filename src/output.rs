//! Output types produced by a generation run.
//!
//! [`StudyOutput`] is what [`crate::generate`] returns: the four artifacts in
//! display order, a description of the context they were generated from, and
//! timing stats. Everything here is `Serialize` so the CLI can print it with
//! `--json`.

use crate::error::ArtifactError;
use crate::pipeline::context::{BoundedContext, ContextSource};
use crate::prompts::ArtifactKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ── Per-call result ──────────────────────────────────────────────────────

/// Normalised outcome of one model call.
///
/// `text` is the trimmed model output on success. On failure it is empty or
/// a `[generation failed]` diagnostic (see [`crate::config::FailureStyle`])
/// and `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub kind: ArtifactKind,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ArtifactError>,
    pub duration_ms: u64,
}

impl GenerationResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

// ── Flashcards ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

/// How the flashcard output ended up being displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum FlashcardsView {
    /// Parsed list of question/answer pairs.
    Cards { cards: Vec<Flashcard> },
    /// Valid JSON, but not a list of cards.
    Json { value: Value },
    /// Not JSON at all; the raw model text.
    Raw { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashcardsArtifact {
    /// Model output exactly as returned (trimmed).
    pub raw: String,
    pub view: FlashcardsView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ArtifactError>,
}

impl FlashcardsArtifact {
    pub fn cards(&self) -> Option<&[Flashcard]> {
        match &self.view {
            FlashcardsView::Cards { cards } => Some(cards),
            _ => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.view, FlashcardsView::Raw { .. })
    }
}

// ── Mind-map ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DiagramStatus {
    Rendered { svg: String },
    /// Graphviz ran and rejected the source.
    RenderFailed { warning: String },
    /// Graphviz is not installed.
    RendererUnavailable { notice: String },
    /// Rendering was switched off in the config.
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMapArtifact {
    /// DOT source as returned by the model.
    pub source: String,
    pub diagram: DiagramStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ArtifactError>,
}

impl MindMapArtifact {
    pub fn svg(&self) -> Option<&str> {
        match &self.diagram {
            DiagramStatus::Rendered { svg } => Some(svg),
            _ => None,
        }
    }
}

// ── Run-level info ───────────────────────────────────────────────────────

/// Where the context came from and how much of it was used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextInfo {
    pub source: ContextSource,
    /// Characters sent in every prompt.
    pub chars: usize,
    /// Characters before truncation.
    pub original_chars: usize,
    pub truncated: bool,
}

impl From<&BoundedContext> for ContextInfo {
    fn from(ctx: &BoundedContext) -> Self {
        Self {
            source: ctx.source(),
            chars: ctx.char_len(),
            original_chars: ctx.original_chars(),
            truncated: ctx.is_truncated(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Model calls that returned text.
    pub succeeded_calls: usize,
    /// Model calls that failed (transport, HTTP, or body shape).
    pub failed_calls: usize,
    /// Wall-clock time per model call.
    pub call_durations_ms: BTreeMap<ArtifactKind, u64>,
    /// Wall-clock time of the four calls together.
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything one generation run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyOutput {
    pub summary: GenerationResult,
    pub flashcards: FlashcardsArtifact,
    pub short_qa: GenerationResult,
    pub mind_map: MindMapArtifact,
    pub context: ContextInfo,
    /// `ModelClient::name()` of the client that served the run.
    pub model: String,
    pub stats: GenerationStats,
}

impl StudyOutput {
    /// Render the four sections as Markdown, in display order.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str("## Summary\n\n");
        push_text_section(&mut md, &self.summary);

        md.push_str("## Flashcards\n\n");
        push_flashcards(&mut md, &self.flashcards);

        md.push_str("## Q&A\n\n");
        push_text_section(&mut md, &self.short_qa);

        md.push_str("## Mind-map\n\n");
        push_mind_map(&mut md, &self.mind_map);

        md.truncate(md.trim_end().len());
        md.push('\n');
        md
    }
}

fn push_text_section(md: &mut String, result: &GenerationResult) {
    if let Some(err) = &result.error {
        push_callout(md, "Warning", &err.to_string());
    }
    if !result.text.is_empty() {
        md.push_str(&result.text);
        md.push_str("\n\n");
    }
}

fn push_flashcards(md: &mut String, artifact: &FlashcardsArtifact) {
    match &artifact.view {
        FlashcardsView::Cards { cards } => {
            for (i, card) in cards.iter().enumerate() {
                md.push_str(&format!(
                    "{}. **Q:** {}\n   **A:** {}\n",
                    i + 1,
                    card.question,
                    card.answer
                ));
            }
            md.push('\n');
        }
        FlashcardsView::Json { value } => {
            let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            push_fenced(md, "json", &pretty);
        }
        FlashcardsView::Raw { text } => {
            if let Some(err) = &artifact.error {
                push_callout(md, "Warning", &err.to_string());
            }
            md.push_str("**Raw flashcards**\n\n");
            push_fenced(md, "text", text);
        }
    }
}

fn push_mind_map(md: &mut String, artifact: &MindMapArtifact) {
    if let Some(err @ ArtifactError::RemoteCallFailed { .. }) = &artifact.error {
        push_callout(md, "Warning", &err.to_string());
    }
    push_fenced(md, "dot", &artifact.source);
    match &artifact.diagram {
        DiagramStatus::Rendered { svg } => {
            md.push_str(&format!("_Diagram rendered ({} bytes of SVG)._\n\n", svg.len()));
        }
        DiagramStatus::RenderFailed { warning } => push_callout(md, "Warning", warning),
        DiagramStatus::RendererUnavailable { notice } => push_callout(md, "Notice", notice),
        DiagramStatus::Disabled => {}
    }
}

fn push_callout(md: &mut String, label: &str, message: &str) {
    md.push_str(&format!("> **{label}:** {message}\n\n"));
}

/// Fence `body`, using a longer backtick run if the body itself contains one.
fn push_fenced(md: &mut String, lang: &str, body: &str) {
    let longest = body
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest.max(2) + 1);
    md.push_str(&format!("{fence}{lang}\n{body}\n{fence}\n\n"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(kind: ArtifactKind, text: &str) -> GenerationResult {
        GenerationResult {
            kind,
            text: text.into(),
            error: None,
            duration_ms: 1,
        }
    }

    fn sample() -> StudyOutput {
        StudyOutput {
            summary: ok(ArtifactKind::Summary, "- one\n- two\n- three"),
            flashcards: FlashcardsArtifact {
                raw: r#"[{"question":"Q1","answer":"A1"}]"#.into(),
                view: FlashcardsView::Cards {
                    cards: vec![Flashcard {
                        question: "Q1".into(),
                        answer: "A1".into(),
                    }],
                },
                error: None,
            },
            short_qa: ok(ArtifactKind::ShortQa, "Q: a? A: b."),
            mind_map: MindMapArtifact {
                source: "digraph { a -> b }".into(),
                diagram: DiagramStatus::RendererUnavailable {
                    notice: ArtifactError::RendererUnavailable.to_string(),
                },
                error: Some(ArtifactError::RendererUnavailable),
            },
            context: ContextInfo {
                source: ContextSource::PastedText,
                chars: 10,
                original_chars: 10,
                truncated: false,
            },
            model: "stub".into(),
            stats: GenerationStats::default(),
        }
    }

    #[test]
    fn markdown_sections_in_display_order() {
        let md = sample().to_markdown();
        let pos = |h: &str| md.find(h).unwrap();
        assert!(pos("## Summary") < pos("## Flashcards"));
        assert!(pos("## Flashcards") < pos("## Q&A"));
        assert!(pos("## Q&A") < pos("## Mind-map"));
        assert!(md.contains("1. **Q:** Q1\n   **A:** A1"));
        assert!(md.contains("```dot\ndigraph { a -> b }\n```"));
        assert!(md.contains("> **Notice:** Graphviz not installed"));
        assert!(md.ends_with('\n') && !md.ends_with("\n\n"));
    }

    #[test]
    fn raw_flashcards_are_labelled() {
        let mut out = sample();
        out.flashcards = FlashcardsArtifact {
            raw: "not json".into(),
            view: FlashcardsView::Raw {
                text: "not json".into(),
            },
            error: Some(ArtifactError::MalformedFlashcards {
                detail: "expected value".into(),
            }),
        };
        let md = out.to_markdown();
        assert!(md.contains("**Raw flashcards**\n\n```text\nnot json\n```"));
        assert!(out.flashcards.is_fallback());
        assert!(out.flashcards.cards().is_none());
    }

    #[test]
    fn fence_grows_past_embedded_backticks() {
        let mut md = String::new();
        push_fenced(&mut md, "text", "```json\n[]\n```");
        assert!(md.starts_with("````text\n"));
        assert!(md.ends_with("\n````\n\n"));
    }

    #[test]
    fn json_shape_is_tagged() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["flashcards"]["view"]["format"], "cards");
        assert_eq!(json["mind_map"]["diagram"]["status"], "renderer_unavailable");
        assert!(json["summary"].get("error").is_none());
    }
}
