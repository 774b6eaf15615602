//! Input resolution: what the user handed us, and the PDF bytes behind it.
//!
//! A run takes pasted text, a PDF, or both. The PDF may be a local path, an
//! HTTP(S) URL, or bytes already in memory (an upload). Only
//! [`resolve_raw_input`] decides which source wins; see
//! [`crate::pipeline::context`] for what happens to it afterwards.

use crate::error::StudyError;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where the PDF comes from.
#[derive(Debug, Clone)]
pub enum PdfSource {
    /// Local file path.
    Path(PathBuf),
    /// HTTP/HTTPS URL, downloaded into memory.
    Url(String),
    /// Bytes already in memory (e.g. an upload).
    Bytes(Vec<u8>),
}

impl PdfSource {
    /// Classify a CLI-style argument as URL or path.
    pub fn from_arg(arg: &str) -> Self {
        if is_url(arg) {
            PdfSource::Url(arg.to_string())
        } else {
            PdfSource::Path(PathBuf::from(arg))
        }
    }
}

/// Everything the user supplied for one generation action.
#[derive(Debug, Clone, Default)]
pub struct StudyInput {
    pub pasted_text: Option<String>,
    pub pdf: Option<PdfSource>,
}

impl StudyInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            pasted_text: Some(text.into()),
            pdf: None,
        }
    }

    pub fn pdf(source: PdfSource) -> Self {
        Self {
            pasted_text: None,
            pdf: Some(source),
        }
    }

    pub fn pdf_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::pdf(PdfSource::Bytes(bytes.into()))
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.pasted_text = Some(text.into());
        self
    }

    pub fn with_pdf(mut self, source: PdfSource) -> Self {
        self.pdf = Some(source);
        self
    }

    /// Pasted text after trimming, if any remains.
    pub fn trimmed_text(&self) -> Option<&str> {
        self.pasted_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// The single input source that will drive the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    /// Pasted text, already trimmed.
    Text(String),
    /// PDF bytes, not yet extracted.
    Pdf(Vec<u8>),
    /// Nothing usable was supplied.
    Empty,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Pick the active source: non-empty pasted text first, then the PDF.
///
/// The PDF is not read at all when pasted text wins, so a bad path next to
/// good text is not an error.
pub async fn resolve_raw_input(
    input: &StudyInput,
    download_timeout_secs: u64,
) -> Result<RawInput, StudyError> {
    if let Some(text) = input.trimmed_text() {
        if input.pdf.is_some() {
            debug!("Pasted text present; ignoring the supplied PDF");
        }
        return Ok(RawInput::Text(text.to_string()));
    }

    match input.pdf {
        Some(ref source) => Ok(RawInput::Pdf(
            load_pdf_bytes(source, download_timeout_secs).await?,
        )),
        None => Ok(RawInput::Empty),
    }
}

/// Read PDF bytes from any source.
pub async fn load_pdf_bytes(source: &PdfSource, timeout_secs: u64) -> Result<Vec<u8>, StudyError> {
    let bytes = match source {
        PdfSource::Bytes(b) => b.clone(),
        PdfSource::Path(path) => read_local(path).await?,
        PdfSource::Url(url) => download_url(url, timeout_secs).await?,
    };

    if bytes.len() >= 4 && &bytes[..4] != b"%PDF" {
        warn!("Input does not start with %PDF; extraction will likely yield no text");
    }
    Ok(bytes)
}

async fn read_local(path: &Path) -> Result<Vec<u8>, StudyError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            debug!("Read {} bytes from {}", bytes.len(), path.display());
            Ok(bytes)
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(StudyError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(StudyError::FileNotFound {
            path: path.to_path_buf(),
        }),
    }
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, StudyError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| StudyError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| StudyError::DownloadFailed {
            url: url.to_string(),
            reason: if e.is_timeout() {
                format!("timed out after {timeout_secs}s")
            } else {
                e.to_string()
            },
        })?;

    if !response.status().is_success() {
        return Err(StudyError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| StudyError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn from_arg_classifies() {
        assert!(matches!(
            PdfSource::from_arg("https://x/y.pdf"),
            PdfSource::Url(_)
        ));
        assert!(matches!(PdfSource::from_arg("notes.pdf"), PdfSource::Path(_)));
    }

    #[test]
    fn whitespace_only_text_is_absent() {
        assert_eq!(StudyInput::text("   \n\t").trimmed_text(), None);
        assert_eq!(StudyInput::text("  hi ").trimmed_text(), Some("hi"));
    }

    #[tokio::test]
    async fn text_wins_over_unreadable_pdf() {
        let input = StudyInput::pdf(PdfSource::Path("/definitely/not/here.pdf".into()))
            .with_text("  pasted  ");
        let raw = resolve_raw_input(&input, 5).await.unwrap();
        assert_eq!(raw, RawInput::Text("pasted".into()));
    }

    #[tokio::test]
    async fn blank_text_falls_through_to_pdf_bytes() {
        let input = StudyInput::pdf_bytes(b"%PDF-1.4 fake".to_vec()).with_text("   ");
        let raw = resolve_raw_input(&input, 5).await.unwrap();
        assert_eq!(raw, RawInput::Pdf(b"%PDF-1.4 fake".to_vec()));
    }

    #[tokio::test]
    async fn nothing_supplied_is_empty() {
        let raw = resolve_raw_input(&StudyInput::default(), 5).await.unwrap();
        assert_eq!(raw, RawInput::Empty);
    }

    #[tokio::test]
    async fn missing_file_is_fatal() {
        let input = StudyInput::pdf(PdfSource::Path("/definitely/not/here.pdf".into()));
        let err = resolve_raw_input(&input, 5).await.unwrap_err();
        assert!(matches!(err, StudyError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn reads_local_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"%PDF-1.7\n").unwrap();
        let source = PdfSource::Path(tmp.path().to_path_buf());
        let bytes = load_pdf_bytes(&source, 5).await.unwrap();
        assert_eq!(bytes, b"%PDF-1.7\n");
    }

    #[tokio::test]
    async fn read_local_takes_borrowed_paths() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"%PDF-1.4\n").unwrap();
        assert_eq!(read_local(tmp.path()).await.unwrap(), b"%PDF-1.4\n");

        let missing = Path::new("/definitely/not/here.pdf");
        match read_local(missing).await.unwrap_err() {
            StudyError::FileNotFound { path } => assert_eq!(path, missing.to_path_buf()),
            other => panic!("unexpected error: {other}"),
        }
    }
}
