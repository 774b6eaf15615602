//! Generation entry points.
//!
//! [`generate`] runs the whole pipeline once: pick the input, bound the
//! context, issue the four prompts, render the results. Everything after the
//! context stage is non-fatal per artifact; the only early stops are input
//! errors and an empty context.

use crate::client::{resolve_client, GenerationOptions, ModelClient};
use crate::config::StudyConfig;
use crate::error::StudyError;
use crate::output::{ContextInfo, GenerationResult, GenerationStats, StudyOutput};
use crate::pipeline::context::{self, BoundedContext};
use crate::pipeline::input::{self, StudyInput};
use crate::pipeline::{llm, render};
use crate::prompts::{prompt_specs, PromptSpec};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Generate the four study artifacts for one input.
///
/// # Errors
/// Returns `Err(StudyError)` only when nothing can be generated:
/// - [`StudyError::EmptyInput`] when neither pasted text nor PDF text is
///   available. No model call is made in that case.
/// - Input errors (file not found, download failed).
/// - [`StudyError::ClientNotConfigured`] when no credential can be found.
///
/// A failed model call or an unparseable answer is recorded in the affected
/// artifact and never fails the run.
pub async fn generate(input: &StudyInput, config: &StudyConfig) -> Result<StudyOutput, StudyError> {
    let total_start = Instant::now();

    // ── Step 1: Bound the context ────────────────────────────────────────
    let context = preview(input, config).await?;
    if context.is_empty() {
        info!("No usable text in input, nothing to generate");
        return Err(StudyError::EmptyInput);
    }

    // ── Step 2: Resolve the model client ─────────────────────────────────
    let client = resolve_client(config)?;
    let options = GenerationOptions::from_config(config);
    info!(
        "Generating study material from {} chars via {}",
        context.char_len(),
        client.name()
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_start(context.char_len(), context.is_truncated());
    }

    // ── Step 3: Four independent calls ───────────────────────────────────
    let [summary, flashcards, short_qa, mind_map] = prompt_specs(config);
    let llm_start = Instant::now();
    let results = if config.concurrent {
        let (s, f, q, m) = futures::join!(
            run_one(&client, summary, &context, &options, config),
            run_one(&client, flashcards, &context, &options, config),
            run_one(&client, short_qa, &context, &options, config),
            run_one(&client, mind_map, &context, &options, config),
        );
        [s, f, q, m]
    } else {
        [
            run_one(&client, summary, &context, &options, config).await,
            run_one(&client, flashcards, &context, &options, config).await,
            run_one(&client, short_qa, &context, &options, config).await,
            run_one(&client, mind_map, &context, &options, config).await,
        ]
    };
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    let succeeded_calls = results.iter().filter(|r| r.is_ok()).count();
    let call_durations_ms = results.iter().map(|r| (r.kind, r.duration_ms)).collect();

    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_complete(succeeded_calls);
    }

    // ── Step 4: Render ───────────────────────────────────────────────────
    let [summary, flashcards, short_qa, mind_map] = results;
    let caps = config.effective_capabilities();
    let flashcards = render::render_flashcards(&flashcards);
    let mind_map = render::render_mind_map(&mind_map, config.render_diagram, &caps).await;

    let stats = GenerationStats {
        succeeded_calls,
        failed_calls: 4 - succeeded_calls,
        call_durations_ms,
        llm_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Generation complete: {}/4 calls succeeded, {}ms total",
        succeeded_calls, stats.total_duration_ms
    );

    Ok(StudyOutput {
        summary,
        flashcards,
        short_qa,
        mind_map,
        context: ContextInfo::from(&context),
        model: client.name(),
        stats,
    })
}

/// Build the bounded context without contacting any model.
///
/// The result may be empty; [`generate`] turns that into
/// [`StudyError::EmptyInput`].
pub async fn preview(input: &StudyInput, config: &StudyConfig) -> Result<BoundedContext, StudyError> {
    let raw = input::resolve_raw_input(input, config.download_timeout_secs).await?;
    let caps = config.effective_capabilities();
    Ok(context::build_context(raw, config.max_context_chars, caps).await)
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(input: &StudyInput, config: &StudyConfig) -> Result<StudyOutput, StudyError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| StudyError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(input, config))
}

/// Generate and write the Markdown report to `output_path`.
///
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// partial report behind.
pub async fn generate_to_file(
    input: &StudyInput,
    output_path: impl AsRef<Path>,
    config: &StudyConfig,
) -> Result<StudyOutput, StudyError> {
    let output = generate(input, config).await?;
    write_atomic(output_path.as_ref(), output.to_markdown().as_bytes()).await?;
    Ok(output)
}

/// Write `contents` to a sibling temp file, then rename it over `path`.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StudyError> {
    let write_failed = |e| StudyError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(write_failed)?;
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run_one(
    client: &Arc<dyn ModelClient>,
    spec: PromptSpec,
    context: &BoundedContext,
    options: &GenerationOptions,
    config: &StudyConfig,
) -> GenerationResult {
    let kind = spec.kind();
    if let Some(ref cb) = config.progress_callback {
        cb.on_artifact_start(kind);
    }
    debug!("{}: sending prompt", kind);

    let result = llm::run_prompt(client, spec, context.as_str(), options, config.failure_style).await;

    if let Some(ref cb) = config.progress_callback {
        match &result.error {
            None => cb.on_artifact_complete(kind, result.text.len()),
            Some(e) => cb.on_artifact_error(kind, &e.to_string()),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn write_atomic_creates_parents_and_leaves_no_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("report.md");
        write_atomic(&path, b"## Summary\n").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "## Summary\n");
        assert!(!dir.path().join("out").join("report.md.tmp").exists());
    }

    #[tokio::test]
    async fn empty_input_stops_before_client_resolution() {
        let config = StudyConfig::builder()
            .backend(crate::config::BackendKind::OpenAi)
            .build()
            .unwrap();
        let err = generate(&StudyInput::text("   \n"), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, StudyError::EmptyInput));
    }

    #[test]
    fn generate_sync_runs_its_own_runtime() {
        let config = StudyConfig::default();
        let err = generate_sync(&StudyInput::default(), &config).unwrap_err();
        assert!(matches!(err, StudyError::EmptyInput));
    }

    #[tokio::test]
    async fn preview_does_not_need_a_client() {
        let config = StudyConfig::default();
        let ctx = preview(&StudyInput::text("  hello  "), &config).await.unwrap();
        assert_eq!(ctx.as_str(), "hello");
    }
}
