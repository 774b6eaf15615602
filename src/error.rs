//! Error types for the edgequake-study library.
//!
//! Four error types reflect four distinct failure scopes:
//!
//! * [`StudyError`] — **Fatal for one generation run**: nothing can be sent to
//!   the model (no usable input, unreadable file, client not configured).
//!   Returned as `Err(StudyError)` from the top-level `generate*` functions.
//!
//! * [`ArtifactError`] — **Non-fatal**: one of the four artifacts failed
//!   (remote call error, unparseable flashcards, diagram render failure) but
//!   the other three are unaffected. Stored inside the artifact in
//!   [`crate::output::StudyOutput`].
//!
//! * [`ClientError`] — **Per call**: the raw reason a model request failed.
//!   [`crate::pipeline::llm`] converts it into an [`ArtifactError`].
//!
//! * [`ExtractionError`] — **Internal**: a PDF backend was missing or choked
//!   on the document. The extractor logs it and moves on to the next backend;
//!   it never reaches the caller.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-study library.
#[derive(Debug, Error)]
pub enum StudyError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Neither pasted text nor PDF text produced any content.
    #[error("No usable text: upload a PDF or paste text to continue.")]
    EmptyInput,

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    // ── Model client errors ───────────────────────────────────────────────
    /// The configured backend cannot be constructed (missing API key etc.).
    #[error("Model backend '{backend}' is not configured.\n{hint}")]
    ClientNotConfigured { backend: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output report.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error attached to a single artifact.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ArtifactError {
    /// Network, HTTP or response-shape failure talking to the model.
    #[error("{artifact}: remote call failed: {detail}")]
    RemoteCallFailed { artifact: String, detail: String },

    /// The flashcard output was not valid JSON; raw text is shown instead.
    #[error("Flashcards: output is not valid JSON ({detail})")]
    MalformedFlashcards { detail: String },

    /// Graphviz was found but rejected the DOT source.
    #[error("Could not render Graphviz chart. Check DOT format. ({detail})")]
    DiagramRenderFailed { detail: String },

    /// No diagram renderer is installed.
    #[error("Graphviz not installed, cannot render mind-map chart.")]
    RendererUnavailable,
}

/// Failure of a single model call, before it is folded into an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Connection, TLS or body-read failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Endpoint answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Body was not the JSON the backend documents.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Body parsed but the text field was absent.
    #[error("response has no '{0}' field")]
    MissingField(&'static str),
}

/// Why a PDF extraction backend produced no text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// The backend is not present in this environment.
    #[error("{backend}: backend unavailable")]
    Unavailable { backend: &'static str },

    /// The backend raised while reading the document.
    #[error("{backend}: extraction failed: {detail}")]
    Failed {
        backend: &'static str,
        detail: String,
    },
}
