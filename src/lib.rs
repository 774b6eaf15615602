//! # edgequake-study
//!
//! Turn a PDF or pasted text into study material with a remote language
//! model: a bulleted summary, flashcards, short Q&A pairs, and a Graphviz
//! mind-map.
//!
//! ## Pipeline Overview
//!
//! ```text
//! pasted text ─┐
//!              ├─ 1. Input     pasted text wins; else PDF (path, URL, bytes)
//! PDF bytes ───┘
//!    ├─ 2. Extract   pdfium, then lopdf; never fails, may yield ""
//!    ├─ 3. Context   first 60 000 chars; empty context stops here
//!    ├─ 4. Generate  four independent model calls (Gemini / OpenAI / edgequake-llm)
//!    └─ 5. Render    flashcard JSON parse with raw fallback, DOT → SVG via Graphviz
//! ```
//!
//! A failed call or an unparseable answer only affects its own artifact.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_study::{generate, StudyConfig, StudyInput};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Key read from GEMINI_API_KEY (or set .api_key(..) / .backend(..))
//!     let config = StudyConfig::builder().num_bullets(3).build()?;
//!     let input = StudyInput::text("Photosynthesis converts light into chemical energy.");
//!     let output = generate(&input, &config).await?;
//!     println!("{}", output.to_markdown());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `study` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-study = { version = "0.1", default-features = false }
//! ```
//!
//! ## Optional System Components
//!
//! | Component | Used for | Without it |
//! |-----------|----------|------------|
//! | libpdfium (`PDFIUM_LIB_PATH` or system) | primary PDF text extraction | lopdf is used |
//! | Graphviz `dot` | mind-map SVG | DOT source plus a notice |
//!
//! Availability is probed once per process, see [`Capabilities::detected`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod study;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{resolve_client, GenerationOptions, ModelClient};
pub use config::{BackendKind, Capabilities, FailureStyle, StudyConfig, StudyConfigBuilder};
pub use error::{ArtifactError, ClientError, ExtractionError, StudyError};
pub use output::{
    ContextInfo, DiagramStatus, Flashcard, FlashcardsArtifact, FlashcardsView, GenerationResult,
    GenerationStats, MindMapArtifact, StudyOutput,
};
pub use pipeline::context::{BoundedContext, ContextSource, DEFAULT_PREVIEW_CHARS};
pub use pipeline::input::{PdfSource, StudyInput};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::{ArtifactKind, PromptSpec};
pub use study::{generate, generate_sync, generate_to_file, preview, write_atomic};
