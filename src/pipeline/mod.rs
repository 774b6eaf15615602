//! Pipeline stages for study-material generation.
//!
//! Each submodule implements exactly one transformation step, so each is
//! independently testable and backends can be swapped without touching the
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ context ──▶ llm ×4 ──▶ render
//! (text/PDF)  (pdfium/lopdf)  (60k chars)  (one call each)  (JSON / DOT)
//! ```
//!
//! 1. [`input`]   — pick the active source (pasted text beats a PDF) and load PDF bytes
//! 2. [`extract`] — PDF bytes → text; runs in `spawn_blocking`, never fails
//! 3. [`context`] — truncate to the context limit; an empty context stops the run
//! 4. [`llm`]     — one request per artifact, failures folded into the result
//! 5. [`postprocess`] — strip fences and invisible characters before parsing
//! 6. [`render`]  — flashcard JSON parse with raw fallback, DOT → SVG via Graphviz

pub mod context;
pub mod extract;
pub mod input;
pub mod llm;
pub mod postprocess;
pub mod render;
