//! PDF text extraction with two backends tried in priority order.
//!
//! 1. **pdfium** (`pdfium-render`) — best text fidelity, needs the pdfium
//!    shared library at runtime (`PDFIUM_LIB_PATH` or a system install).
//! 2. **lopdf** — pure Rust, always compiled in, weaker on exotic fonts.
//!
//! Availability is decided once by [`crate::config::Capabilities`] and
//! checked before dispatch. A backend that fails hands over to the next
//! one; results are never merged. If nothing succeeds the extractor returns
//! an empty string: it never fails to the caller.
//!
//! Output is the per-page text joined by a blank line, trimmed as a whole.

use crate::config::{non_empty_env, Capabilities};
use crate::error::ExtractionError;
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// The extraction backends, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionBackend {
    Pdfium,
    Lopdf,
}

impl ExtractionBackend {
    pub const ORDER: [ExtractionBackend; 2] = [ExtractionBackend::Pdfium, ExtractionBackend::Lopdf];

    pub fn name(&self) -> &'static str {
        match self {
            ExtractionBackend::Pdfium => "pdfium",
            ExtractionBackend::Lopdf => "lopdf",
        }
    }

    fn enabled(&self, caps: &Capabilities) -> bool {
        match self {
            ExtractionBackend::Pdfium => caps.pdfium,
            ExtractionBackend::Lopdf => caps.lopdf,
        }
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        match self {
            ExtractionBackend::Pdfium => extract_with_pdfium(bytes),
            ExtractionBackend::Lopdf => extract_with_lopdf(bytes),
        }
    }
}

/// Outcome of one extraction: the text plus what happened on the way.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Extracted text, possibly empty.
    pub text: String,
    /// Backend that produced `text`, None when every backend was skipped or failed.
    pub backend: Option<ExtractionBackend>,
    /// Reasons earlier backends were skipped or failed.
    pub errors: Vec<ExtractionError>,
}

/// Extract text off the async executor.
///
/// pdfium is blocking and not async-safe, so the work runs in
/// `spawn_blocking`. A panicking backend is treated as a failed one.
pub async fn extract_text(bytes: Vec<u8>, caps: Capabilities) -> Extraction {
    match tokio::task::spawn_blocking(move || extract_text_blocking(&bytes, &caps)).await {
        Ok(extraction) => extraction,
        Err(e) => {
            warn!("Extraction task failed: {}", e);
            Extraction::default()
        }
    }
}

/// Blocking implementation of [`extract_text`].
pub fn extract_text_blocking(bytes: &[u8], caps: &Capabilities) -> Extraction {
    let mut errors = Vec::new();

    for backend in ExtractionBackend::ORDER {
        if !backend.enabled(caps) {
            debug!("{}: not available, skipping", backend.name());
            errors.push(ExtractionError::Unavailable {
                backend: backend.name(),
            });
            continue;
        }

        let attempt = catch_unwind(AssertUnwindSafe(|| backend.extract(bytes)));
        match attempt {
            Ok(Ok(text)) => {
                info!(
                    "Extracted {} chars with {}",
                    text.chars().count(),
                    backend.name()
                );
                return Extraction {
                    text,
                    backend: Some(backend),
                    errors,
                };
            }
            Ok(Err(e)) => {
                warn!("{}; trying next backend", e);
                errors.push(e);
            }
            Err(_) => {
                let e = ExtractionError::Failed {
                    backend: backend.name(),
                    detail: "backend panicked".into(),
                };
                warn!("{}; trying next backend", e);
                errors.push(e);
            }
        }
    }

    warn!("No extraction backend produced text");
    Extraction {
        text: String::new(),
        backend: None,
        errors,
    }
}

/// Join per-page texts with a blank line and trim the whole.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    pages
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim()
        .to_string()
}

// ── pdfium ───────────────────────────────────────────────────────────────

/// Bind pdfium from `PDFIUM_LIB_PATH` (file or directory), else the system library.
fn bind_pdfium() -> Result<Box<dyn PdfiumLibraryBindings>, PdfiumError> {
    if let Some(path) = non_empty_env("PDFIUM_LIB_PATH") {
        let path = PathBuf::from(path);
        let lib = if path.is_dir() {
            Pdfium::pdfium_platform_library_name_at_path(&path)
        } else {
            path
        };
        return Pdfium::bind_to_library(lib);
    }
    Pdfium::bind_to_system_library()
}

/// Whether the pdfium shared library can be bound in this process.
pub fn pdfium_available() -> bool {
    bind_pdfium().is_ok()
}

fn extract_with_pdfium(bytes: &[u8]) -> Result<String, ExtractionError> {
    let bindings = bind_pdfium().map_err(|_| ExtractionError::Unavailable { backend: "pdfium" })?;
    let pdfium = Pdfium::new(bindings);

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| ExtractionError::Failed {
            backend: "pdfium",
            detail: format!("{:?}", e),
        })?;

    let mut pages = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let text = page.text().map_err(|e| ExtractionError::Failed {
            backend: "pdfium",
            detail: format!("page {}: {:?}", idx + 1, e),
        })?;
        pages.push(text.all());
    }

    debug!("pdfium: {} pages", pages.len());
    Ok(join_pages(&pages))
}

// ── lopdf ────────────────────────────────────────────────────────────────

fn extract_with_lopdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| ExtractionError::Failed {
        backend: "lopdf",
        detail: e.to_string(),
    })?;

    // BTreeMap keys: page numbers in document order.
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let pages: Vec<String> = page_numbers
        .iter()
        .map(|&n| {
            doc.extract_text(&[n]).unwrap_or_else(|e| {
                debug!("lopdf: page {} has no extractable text: {}", n, e);
                String::new()
            })
        })
        .collect();

    debug!("lopdf: {} pages", pages.len());
    Ok(join_pages(&pages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Document, Object, Stream};

    /// Build an in-memory PDF with one Helvetica text line per page.
    fn create_pdf(page_texts: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut page_ids = Vec::new();
        for text in page_texts {
            let content = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", text);
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => resources_id,
                "Contents" => content_id,
            });
            page_ids.push(page_id);
        }

        let kids: Vec<Object> = page_ids.iter().map(|&id| id.into()).collect();
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_texts.len() as i64),
        });
        for page_id in &page_ids {
            if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(*page_id) {
                dict.set("Parent", pages_id);
            }
        }

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn join_pages_uses_blank_line_and_trims() {
        assert_eq!(join_pages(&["  one", "two", "three \n"]), "one\n\ntwo\n\nthree");
        assert_eq!(join_pages::<&str>(&[]), "");
    }

    #[test]
    fn lopdf_extracts_every_page() {
        let pdf = create_pdf(&["Alpha", "Beta"]);
        let out = extract_text_blocking(&pdf, &Capabilities::pure_rust());
        assert_eq!(out.backend, Some(ExtractionBackend::Lopdf));
        assert!(out.text.contains("Alpha"), "got: {:?}", out.text);
        assert!(out.text.contains("Beta"), "got: {:?}", out.text);
        assert!(out.text.find("Alpha") < out.text.find("Beta"));
        assert_eq!(out.text, out.text.trim());
    }

    #[test]
    fn garbage_bytes_yield_empty_text() {
        for bytes in [
            b"this is not a valid pdf file".to_vec(),
            Vec::new(),
            vec![0xFF; 64],
        ] {
            let out = extract_text_blocking(&bytes, &Capabilities::pure_rust());
            assert_eq!(out.text, "");
            assert_eq!(out.backend, None);
            assert!(out
                .errors
                .iter()
                .any(|e| matches!(e, ExtractionError::Failed { backend: "lopdf", .. })));
        }
    }

    #[test]
    fn no_backends_yield_empty_text() {
        let pdf = create_pdf(&["Alpha"]);
        let out = extract_text_blocking(&pdf, &Capabilities::none());
        assert_eq!(out.text, "");
        assert_eq!(
            out.errors,
            vec![
                ExtractionError::Unavailable { backend: "pdfium" },
                ExtractionError::Unavailable { backend: "lopdf" },
            ]
        );
    }

    #[tokio::test]
    async fn async_wrapper_matches_blocking() {
        let pdf = create_pdf(&["Gamma"]);
        let out = extract_text(pdf.clone(), Capabilities::pure_rust()).await;
        assert_eq!(
            out.text,
            extract_text_blocking(&pdf, &Capabilities::pure_rust()).text
        );
    }
}
