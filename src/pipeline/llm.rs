//! Model interaction: one prompt spec in, one [`GenerationResult`] out.
//!
//! All prompt wording lives in [`crate::prompts`]; this module only sends it
//! and normalises the answer. Successful text is trimmed. Failures never
//! propagate: they become a result carrying an
//! [`ArtifactError::RemoteCallFailed`] so sibling artifacts are unaffected.

use crate::client::{GenerationOptions, ModelClient};
use crate::config::FailureStyle;
use crate::error::{ArtifactError, ClientError};
use crate::output::GenerationResult;
use crate::prompts::{ArtifactKind, PromptSpec};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Prefix of the failure text under [`FailureStyle::Diagnostic`].
pub const DIAGNOSTIC_PREFIX: &str = "[generation failed]";

/// Send one prompt and normalise the outcome.
///
/// Exactly one request is made; there is no retry.
pub async fn run_prompt(
    client: &Arc<dyn ModelClient>,
    spec: PromptSpec,
    context: &str,
    options: &GenerationOptions,
    failure_style: FailureStyle,
) -> GenerationResult {
    let kind = spec.kind();
    let prompt = spec.build(context);
    let start = Instant::now();

    let outcome = client.generate(&prompt, options).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(text) => {
            let text = text.trim().to_string();
            debug!(
                "{}: {} chars in {}ms via {}",
                kind,
                text.chars().count(),
                duration_ms,
                client.name()
            );
            GenerationResult {
                kind,
                text,
                error: None,
                duration_ms,
            }
        }
        Err(e) => {
            warn!("{}: model call failed — {}", kind, e);
            failed_result(kind, &e, failure_style, duration_ms)
        }
    }
}

/// Build the normalised result for a failed call.
pub fn failed_result(
    kind: ArtifactKind,
    err: &ClientError,
    style: FailureStyle,
    duration_ms: u64,
) -> GenerationResult {
    let detail = err.to_string();
    let text = match style {
        FailureStyle::Empty => String::new(),
        FailureStyle::Diagnostic => format!("{DIAGNOSTIC_PREFIX} {detail}"),
    };
    GenerationResult {
        kind,
        text,
        error: Some(ArtifactError::RemoteCallFailed {
            artifact: kind.label().to_string(),
            detail,
        }),
        duration_ms,
    }
}
