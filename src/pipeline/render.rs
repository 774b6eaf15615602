//! Artifact rendering: shape-check the raw model output.
//!
//! * Flashcards are parsed as JSON. Any parse failure falls back to the raw
//!   text, labelled, never an error escape.
//! * The mind-map keeps its DOT source verbatim and, when Graphviz is
//!   installed, is also rendered to SVG by piping it through `dot -Tsvg`.
//!   A failed render becomes a visible warning; a missing `dot` becomes a
//!   visible notice.
//! * Summary and Q&A are shown as-is and need no rendering.

use crate::config::Capabilities;
use crate::error::ArtifactError;
use crate::output::{
    DiagramStatus, Flashcard, FlashcardsArtifact, FlashcardsView, GenerationResult,
    MindMapArtifact,
};
use crate::pipeline::postprocess::{clean_for_parse, looks_like_dot};
use serde_json::Value;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

// ── Flashcards ───────────────────────────────────────────────────────────

/// Parse the flashcard output, falling back to raw text.
///
/// Accepted structures, in order of preference:
/// 1. `[{"question": …, "answer": …}, …]`
/// 2. `{"flashcards": [ …same… ]}`
/// 3. any other valid JSON, kept as a JSON value
pub fn render_flashcards(result: &GenerationResult) -> FlashcardsArtifact {
    let raw = result.text.clone();
    let cleaned = clean_for_parse(&raw);

    match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => {
            let view = match as_cards(&value) {
                Some(cards) => {
                    debug!("Flashcards: parsed {} cards", cards.len());
                    FlashcardsView::Cards { cards }
                }
                None => {
                    debug!("Flashcards: valid JSON of another shape");
                    FlashcardsView::Json { value }
                }
            };
            FlashcardsArtifact {
                raw,
                view,
                error: result.error.clone(),
            }
        }
        Err(e) => {
            if result.error.is_none() {
                warn!("Flashcards: not valid JSON, showing raw text ({})", e);
            }
            let error = result
                .error
                .clone()
                .unwrap_or(ArtifactError::MalformedFlashcards {
                    detail: e.to_string(),
                });
            FlashcardsArtifact {
                view: FlashcardsView::Raw { text: raw.clone() },
                raw,
                error: Some(error),
            }
        }
    }
}

fn as_cards(value: &Value) -> Option<Vec<Flashcard>> {
    let list = match value {
        Value::Array(_) => value,
        Value::Object(map) => map.get("flashcards")?,
        _ => return None,
    };
    serde_json::from_value(list.clone()).ok()
}

// ── Mind-map ─────────────────────────────────────────────────────────────

/// Keep the DOT source and try to render it.
pub async fn render_mind_map(
    result: &GenerationResult,
    render_diagram: bool,
    caps: &Capabilities,
) -> MindMapArtifact {
    let source = result.text.clone();

    let (diagram, render_error) = if !render_diagram {
        (DiagramStatus::Disabled, None)
    } else if !caps.graphviz {
        let err = ArtifactError::RendererUnavailable;
        (
            DiagramStatus::RendererUnavailable {
                notice: err.to_string(),
            },
            Some(err),
        )
    } else {
        match render_dot_svg(&clean_for_parse(&source)).await {
            Ok(svg) => (DiagramStatus::Rendered { svg }, None),
            Err(err) => {
                warn!("Mind-map: {}", err);
                (
                    DiagramStatus::RenderFailed {
                        warning: err.to_string(),
                    },
                    Some(err),
                )
            }
        }
    };

    MindMapArtifact {
        source,
        diagram,
        error: result.error.clone().or(render_error),
    }
}

/// Graphviz executable: `GRAPHVIZ_DOT` if set, else `dot` on the PATH.
fn dot_program() -> String {
    std::env::var("GRAPHVIZ_DOT").unwrap_or_else(|_| "dot".to_string())
}

/// Whether `dot -V` runs successfully.
pub fn graphviz_available() -> bool {
    std::process::Command::new(dot_program())
        .arg("-V")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Pipe DOT source through `dot -Tsvg`.
pub async fn render_dot_svg(dot: &str) -> Result<String, ArtifactError> {
    if !looks_like_dot(dot) {
        return Err(ArtifactError::DiagramRenderFailed {
            detail: "output is not a graph/digraph block".into(),
        });
    }

    let failed = |detail: String| ArtifactError::DiagramRenderFailed { detail };

    let mut child = tokio::process::Command::new(dot_program())
        .arg("-Tsvg")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| failed(e.to_string()))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(dot.as_bytes())
            .await
            .map_err(|e| failed(e.to_string()))?;
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| failed(e.to_string()))?;

    if !output.status.success() {
        return Err(failed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    String::from_utf8(output.stdout).map_err(|e| failed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::ArtifactKind;

    fn ok(kind: ArtifactKind, text: &str) -> GenerationResult {
        GenerationResult {
            kind,
            text: text.to_string(),
            error: None,
            duration_ms: 0,
        }
    }

    #[test]
    fn flashcards_array_is_structured() {
        let a = render_flashcards(&ok(
            ArtifactKind::Flashcards,
            r#"[{"question":"Q1","answer":"A1"}]"#,
        ));
        assert_eq!(
            a.view,
            FlashcardsView::Cards {
                cards: vec![Flashcard {
                    question: "Q1".into(),
                    answer: "A1".into()
                }]
            }
        );
        assert!(a.error.is_none());
    }

    #[test]
    fn flashcards_not_json_falls_back_to_raw() {
        let a = render_flashcards(&ok(ArtifactKind::Flashcards, "not json"));
        assert_eq!(
            a.view,
            FlashcardsView::Raw {
                text: "not json".into()
            }
        );
        assert!(matches!(
            a.error,
            Some(ArtifactError::MalformedFlashcards { .. })
        ));
    }

    #[test]
    fn fenced_flashcards_are_parsed() {
        let a = render_flashcards(&ok(
            ArtifactKind::Flashcards,
            "```json\n[{\"question\":\"Q\",\"answer\":\"A\"}]\n```",
        ));
        assert!(matches!(a.view, FlashcardsView::Cards { ref cards } if cards.len() == 1));
        assert!(a.raw.starts_with("```json"));
    }

    #[test]
    fn wrapped_flashcards_object_is_parsed() {
        let a = render_flashcards(&ok(
            ArtifactKind::Flashcards,
            r#"{"flashcards":[{"question":"Q","answer":"A"},{"question":"Q2","answer":"A2"}]}"#,
        ));
        assert!(matches!(a.view, FlashcardsView::Cards { ref cards } if cards.len() == 2));
    }

    #[test]
    fn other_json_is_kept_as_value() {
        let a = render_flashcards(&ok(ArtifactKind::Flashcards, r#"{"cards": 3}"#));
        assert_eq!(
            a.view,
            FlashcardsView::Json {
                value: serde_json::json!({"cards": 3})
            }
        );
    }

    #[test]
    fn failed_call_keeps_remote_error() {
        let r = GenerationResult {
            kind: ArtifactKind::Flashcards,
            text: String::new(),
            error: Some(ArtifactError::RemoteCallFailed {
                artifact: "Flashcards".into(),
                detail: "HTTP 500: boom".into(),
            }),
            duration_ms: 0,
        };
        let a = render_flashcards(&r);
        assert_eq!(a.view, FlashcardsView::Raw { text: String::new() });
        assert!(matches!(
            a.error,
            Some(ArtifactError::RemoteCallFailed { .. })
        ));
    }

    #[tokio::test]
    async fn missing_graphviz_gives_notice() {
        let m = render_mind_map(
            &ok(ArtifactKind::MindMap, "digraph { a -> b }"),
            true,
            &Capabilities::none(),
        )
        .await;
        assert_eq!(m.source, "digraph { a -> b }");
        assert_eq!(
            m.diagram,
            DiagramStatus::RendererUnavailable {
                notice: "Graphviz not installed, cannot render mind-map chart.".into()
            }
        );
        assert_eq!(m.error, Some(ArtifactError::RendererUnavailable));
    }

    #[tokio::test]
    async fn disabled_rendering_keeps_source_only() {
        let m = render_mind_map(
            &ok(ArtifactKind::MindMap, "digraph { a }"),
            false,
            &Capabilities::none(),
        )
        .await;
        assert_eq!(m.diagram, DiagramStatus::Disabled);
        assert!(m.error.is_none());
    }

    #[test]
    fn prose_is_rejected_before_spawning_dot() {
        let err = tokio_test::block_on(render_dot_svg("Sure! Here is a mind map.")).unwrap_err();
        assert!(matches!(err, ArtifactError::DiagramRenderFailed { .. }));
        assert!(err.to_string().starts_with("Could not render Graphviz chart."));
    }
}
