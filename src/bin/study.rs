//! CLI binary for edgequake-study.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `StudyConfig` and prints the study report.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_study::{
    generate, generate_to_file, preview, write_atomic, ArtifactKind, BackendKind, FailureStyle,
    GenerationProgressCallback, PdfSource, ProgressCallback, StudyConfig, StudyError, StudyInput,
    DEFAULT_PREVIEW_CHARS,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Busy indicator: a spinner while calls are in flight, one log line per
/// finished artifact. Artifacts may finish in any order.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<ArtifactKind, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading input…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self::with_bar(bar)
    }

    fn with_bar(bar: ProgressBar) -> Arc<Self> {
        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    /// Remove the spinner line. Safe to call more than once.
    fn clear(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }

    fn elapsed_secs(&self, kind: ArtifactKind) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&kind))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_generation_start(&self, context_chars: usize, truncated: bool) {
        self.bar.set_prefix("Generating");
        self.bar.set_message("summary, flashcards, Q&A, mind-map");
        let note = if truncated { " (truncated)" } else { "" };
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Context: {context_chars} chars{note}"))
        ));
    }

    fn on_artifact_start(&self, kind: ArtifactKind) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(kind, Instant::now());
        }
    }

    fn on_artifact_complete(&self, kind: ArtifactKind, text_len: usize) {
        let secs = self.elapsed_secs(kind);
        self.bar.println(format!(
            "  {} {:<11} {}  {}",
            green("✓"),
            kind.label(),
            dim(&format!("{text_len:>6} chars")),
            dim(&format!("{secs:.1}s")),
        ));
    }

    fn on_artifact_error(&self, kind: ArtifactKind, error: &str) {
        let secs = self.elapsed_secs(kind);
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:<11} {}  {}",
            red("✗"),
            kind.label(),
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
    }

    fn on_generation_complete(&self, succeeded: usize) {
        self.clear();
        if succeeded == 4 {
            eprintln!("{} all 4 artifacts generated", green("✔"));
        } else {
            eprintln!(
                "{} {}/4 artifacts generated",
                if succeeded == 0 { red("✘") } else { cyan("⚠") },
                bold(&succeeded.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Study material from a PDF (Markdown on stdout)
  study lecture.pdf

  # Pasted text, written to a report file
  study --text "Photosynthesis converts light into chemical energy." -o notes.md

  # Text from stdin, fewer bullets, more flashcards
  cat chapter.txt | study --text-file - --bullets 3 --flashcards 20

  # PDF from a URL, keep the rendered mind-map
  study https://arxiv.org/pdf/1706.03762 --svg mindmap.svg

  # Any OpenAI-compatible server
  study --backend openai --base-url http://localhost:11434/v1 --model llama3.2 notes.pdf

  # Show the text that would be sent (no API key needed)
  study --preview-only scanned.pdf

INPUT PRECEDENCE:
  Non-empty pasted text (--text / --text-file) wins over a PDF argument.
  The first 60,000 characters are used; the rest is dropped silently.

ENVIRONMENT VARIABLES:
  STUDY_BACKEND           gemini (default), openai, provider
  STUDY_MODEL             Model ID (gemini-1.5-flash / gpt-4o-mini by default)
  STUDY_API_KEY           API key for the selected backend
  STUDY_BASE_URL          Endpoint override
  GEMINI_API_KEY          Fallback key for --backend gemini (also GOOGLE_API_KEY)
  OPENAI_API_KEY          Fallback key for --backend openai
  EDGEQUAKE_LLM_PROVIDER  Provider for --backend provider (openai, anthropic, ollama, …)
  EDGEQUAKE_MODEL         Model for --backend provider
  PDFIUM_LIB_PATH         Path to libpdfium; without it the pure-Rust extractor is used
  GRAPHVIZ_DOT            Path to the Graphviz `dot` executable
"#;

/// Turn a PDF or pasted text into a summary, flashcards, Q&A and a mind-map.
#[derive(Parser, Debug)]
#[command(
    name = "study",
    version,
    about = "Generate study material (summary, flashcards, Q&A, mind-map) from a PDF or text",
    long_about = "Generate study material from a PDF (local file or URL) or pasted text using a \
remote language model. Supports Google Gemini, any OpenAI-compatible endpoint, and every \
provider known to edgequake-llm.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: Option<String>,

    /// Pasted text. Takes precedence over the PDF when non-empty.
    #[arg(long, conflicts_with = "text_file")]
    text: Option<String>,

    /// Read pasted text from a file (`-` for stdin).
    #[arg(long)]
    text_file: Option<PathBuf>,

    /// Write the Markdown report to this file instead of stdout.
    #[arg(short, long, env = "STUDY_OUTPUT")]
    output: Option<PathBuf>,

    /// Remote backend: gemini, openai, provider.
    #[arg(long, env = "STUDY_BACKEND", value_enum, default_value = "gemini")]
    backend: BackendArg,

    /// Model ID (backend default if unset).
    #[arg(long, env = "STUDY_MODEL")]
    model: Option<String>,

    /// API key for the selected backend.
    #[arg(long, env = "STUDY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Endpoint base URL override.
    #[arg(long, env = "STUDY_BASE_URL")]
    base_url: Option<String>,

    /// edgequake-llm provider name for `--backend provider`.
    #[arg(long, env = "EDGEQUAKE_LLM_PROVIDER")]
    provider: Option<String>,

    /// Summary bullet points (3–10).
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(3..=10))]
    bullets: u32,

    /// Flashcards (3–30).
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(3..=30))]
    flashcards: u32,

    /// Short Q&A pairs (3–20).
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(3..=20))]
    qa: u32,

    /// Characters of input sent to the model.
    #[arg(long, env = "STUDY_MAX_CONTEXT", default_value_t = 60_000)]
    max_context_chars: usize,

    /// Max output tokens per call.
    #[arg(long, env = "STUDY_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "STUDY_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Issue the four calls one after another.
    #[arg(long)]
    sequential: bool,

    /// Put a "[generation failed] …" line in failed artifacts instead of leaving them empty.
    #[arg(long)]
    diagnostic_failures: bool,

    /// Do not render the mind-map with Graphviz.
    #[arg(long)]
    no_diagram: bool,

    /// Write the rendered mind-map SVG to this file.
    #[arg(long, conflicts_with = "no_diagram")]
    svg: Option<PathBuf>,

    /// Output structured JSON (StudyOutput) instead of Markdown.
    #[arg(long, env = "STUDY_JSON")]
    json: bool,

    /// Print the first 3,000 characters of the context and exit.
    #[arg(long)]
    preview_only: bool,

    /// Disable the busy indicator.
    #[arg(long, env = "STUDY_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "STUDY_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "STUDY_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "STUDY_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    Gemini,
    Openai,
    Provider,
}

impl From<BackendArg> for BackendKind {
    fn from(v: BackendArg) -> Self {
        match v {
            BackendArg::Gemini => BackendKind::Gemini,
            BackendArg::Openai => BackendKind::OpenAi,
            BackendArg::Provider => BackendKind::Provider,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO-level library logs are noise next to the spinner.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.preview_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let input = read_input(&cli)?;

    let spinner = show_progress.then(CliProgressCallback::new);
    let clear_spinner = || {
        if let Some(ref s) = spinner {
            s.clear();
        }
    };
    let progress_cb = spinner.clone().map(|s| s as ProgressCallback);
    let config = build_config(&cli, progress_cb).inspect_err(|_| clear_spinner())?;

    // ── Preview-only mode ────────────────────────────────────────────────
    if cli.preview_only {
        let context = preview(&input, &config)
            .await
            .context("Failed to read input")?;
        if cli.json {
            let json = serde_json::json!({
                "source": context.source(),
                "chars": context.char_len(),
                "original_chars": context.original_chars(),
                "truncated": context.is_truncated(),
                "preview": context.preview(DEFAULT_PREVIEW_CHARS),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&json).context("Failed to serialise preview")?
            );
        } else if context.is_empty() {
            eprintln!("{}", StudyError::EmptyInput);
        } else {
            println!("{}", context.preview(DEFAULT_PREVIEW_CHARS));
            if !cli.quiet {
                eprintln!(
                    "{}",
                    dim(&format!(
                        "{} chars of context{}",
                        context.char_len(),
                        if context.is_truncated() {
                            format!(" (cut from {})", context.original_chars())
                        } else {
                            String::new()
                        }
                    ))
                );
            }
        }
        return Ok(());
    }

    // ── Run generation ───────────────────────────────────────────────────
    let result = match (&cli.output, cli.json) {
        (Some(path), false) => generate_to_file(&input, path, &config).await,
        _ => generate(&input, &config).await,
    };
    // Early stops never reach on_generation_complete.
    clear_spinner();

    let output = match result {
        Ok(output) => output,
        Err(StudyError::EmptyInput) => {
            // Normal stop: nothing to study yet.
            eprintln!("{} {}", cyan("ℹ"), StudyError::EmptyInput);
            std::process::exit(2);
        }
        Err(e) => return Err(e).context("Generation failed"),
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        match cli.output {
            Some(ref path) => write_atomic(path, json.as_bytes())
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?,
            None => println!("{json}"),
        }
    } else if cli.output.is_none() {
        let md = output.to_markdown();
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(md.as_bytes())
            .context("Failed to write to stdout")?;
    }

    if let Some(ref svg_path) = cli.svg {
        match output.mind_map.svg() {
            Some(svg) => write_atomic(svg_path, svg.as_bytes())
                .await
                .with_context(|| format!("Failed to write {}", svg_path.display()))?,
            None => eprintln!(
                "{} no mind-map diagram to write to {}",
                cyan("⚠"),
                svg_path.display()
            ),
        }
    }

    if !cli.quiet && !show_progress {
        eprintln!(
            "Generated {}/4 artifacts in {}ms via {}",
            output.stats.succeeded_calls, output.stats.total_duration_ms, output.model
        );
    } else if !cli.quiet {
        let dest = cli
            .output
            .as_ref()
            .map(|p| format!("  →  {}", bold(&p.display().to_string())))
            .unwrap_or_default();
        eprintln!(
            "   {} context chars  —  {}ms total{}",
            dim(&output.context.chars.to_string()),
            output.stats.total_duration_ms,
            dest,
        );
    }

    Ok(())
}

/// Collect pasted text and the PDF argument.
fn read_input(cli: &Cli) -> Result<StudyInput> {
    let pasted = match (&cli.text, &cli.text_file) {
        (Some(text), _) => Some(text.clone()),
        (None, Some(path)) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read text from stdin")?;
            Some(buf)
        }
        (None, Some(path)) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read text from {}", path.display()))?,
        ),
        (None, None) => None,
    };

    Ok(StudyInput {
        pasted_text: pasted,
        pdf: cli.input.as_deref().map(PdfSource::from_arg),
    })
}

/// Map CLI args to `StudyConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<StudyConfig> {
    let mut builder = StudyConfig::builder()
        .backend(cli.backend.into())
        .num_bullets(cli.bullets)
        .num_flashcards(cli.flashcards)
        .num_short_qa(cli.qa)
        .max_context_chars(cli.max_context_chars)
        .max_output_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .concurrent(!cli.sequential)
        .render_diagram(!cli.no_diagram)
        .download_timeout_secs(cli.download_timeout)
        .failure_style(if cli.diagnostic_failures {
            FailureStyle::Diagnostic
        } else {
            FailureStyle::Empty
        });

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref url) = cli.base_url {
        builder = builder.base_url(url);
    }
    if let Some(ref name) = cli.provider {
        builder = builder.provider_name(name);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
