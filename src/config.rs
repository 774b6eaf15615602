//! Configuration types for study-material generation.
//!
//! All generation behaviour is controlled through [`StudyConfig`], built via
//! its [`StudyConfigBuilder`]. Credentials, endpoint and model identifier are
//! plain configuration fields filled from the caller or the environment; the
//! library never embeds a key.

use crate::client::ModelClient;
use crate::error::StudyError;
use crate::pipeline::{extract, render};
use crate::progress::ProgressCallback;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Maximum number of characters of input sent to the model.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 60_000;

/// Allowed range for the number of summary bullets.
pub const BULLETS_RANGE: (u32, u32) = (3, 10);
/// Allowed range for the number of flashcards.
pub const FLASHCARDS_RANGE: (u32, u32) = (3, 30);
/// Allowed range for the number of short Q&A pairs.
pub const SHORT_QA_RANGE: (u32, u32) = (3, 20);

/// Configuration for one generation run.
///
/// Built via [`StudyConfig::builder()`] or using [`StudyConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_study::{BackendKind, StudyConfig};
///
/// let config = StudyConfig::builder()
///     .backend(BackendKind::Gemini)
///     .num_bullets(5)
///     .num_flashcards(12)
///     .build()
///     .unwrap();
/// assert_eq!(config.num_flashcards, 12);
/// ```
#[derive(Clone)]
pub struct StudyConfig {
    /// Number of summary bullet points. Range: 3–10. Default: 5.
    pub num_bullets: u32,

    /// Number of flashcards. Range: 3–30. Default: 10.
    pub num_flashcards: u32,

    /// Number of short Q&A pairs. Range: 3–20. Default: 8.
    pub num_short_qa: u32,

    /// Characters of input kept for the prompts. Default: 60 000.
    ///
    /// Longer input is cut silently to its first `max_context_chars` chars.
    pub max_context_chars: usize,

    /// Which remote backend to talk to. Default: [`BackendKind::Gemini`].
    pub backend: BackendKind,

    /// Model identifier. If None, the backend default is used.
    pub model: Option<String>,

    /// API credential. If None, read from the backend's env variable.
    pub api_key: Option<String>,

    /// Endpoint base URL override (proxies, self-hosted OpenAI-compatible servers).
    pub base_url: Option<String>,

    /// Provider name for [`BackendKind::Provider`] (e.g. "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed model client. Takes precedence over every backend field.
    pub client: Option<Arc<dyn ModelClient>>,

    /// Sampling temperature. Default: 0.2.
    pub temperature: f32,

    /// Maximum output tokens per call. Default: 2048.
    pub max_output_tokens: usize,

    /// Text placed in a failed artifact. Default: [`FailureStyle::Empty`].
    pub failure_style: FailureStyle,

    /// Issue the four calls concurrently. Default: true.
    ///
    /// The calls are independent, so this only changes latency; artifacts
    /// are always reported in Summary, Flashcards, Q&A, Mind-map order.
    pub concurrent: bool,

    /// Try to render the mind-map with Graphviz. Default: true.
    pub render_diagram: bool,

    /// Optional-backend availability. If None, [`Capabilities::detected`] is used.
    pub capabilities: Option<Capabilities>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional progress hooks (busy indicator).
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            num_bullets: 5,
            num_flashcards: 10,
            num_short_qa: 8,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            backend: BackendKind::default(),
            model: None,
            api_key: None,
            base_url: None,
            provider_name: None,
            client: None,
            temperature: 0.2,
            max_output_tokens: 2048,
            failure_style: FailureStyle::default(),
            concurrent: true,
            render_diagram: true,
            capabilities: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for StudyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudyConfig")
            .field("num_bullets", &self.num_bullets)
            .field("num_flashcards", &self.num_flashcards)
            .field("num_short_qa", &self.num_short_qa)
            .field("max_context_chars", &self.max_context_chars)
            .field("backend", &self.backend)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("provider_name", &self.provider_name)
            .field("client", &self.client.as_ref().map(|_| "<dyn ModelClient>"))
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("failure_style", &self.failure_style)
            .field("concurrent", &self.concurrent)
            .field("render_diagram", &self.render_diagram)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

impl StudyConfig {
    /// Create a new builder for `StudyConfig`.
    pub fn builder() -> StudyConfigBuilder {
        StudyConfigBuilder {
            config: Self::default(),
        }
    }

    /// Default configuration with backend fields taken from the `STUDY_*`
    /// environment variables. See [`StudyConfigBuilder::from_env`].
    pub fn from_env() -> Result<Self, StudyError> {
        Self::builder().from_env()?.build()
    }

    /// Capabilities for this run: the explicit override, else the process-wide probe.
    pub fn effective_capabilities(&self) -> Capabilities {
        self.capabilities.unwrap_or_else(Capabilities::detected)
    }
}

/// Builder for [`StudyConfig`].
#[derive(Debug)]
pub struct StudyConfigBuilder {
    config: StudyConfig,
}

impl StudyConfigBuilder {
    pub fn num_bullets(mut self, n: u32) -> Self {
        self.config.num_bullets = n;
        self
    }

    pub fn num_flashcards(mut self, n: u32) -> Self {
        self.config.num_flashcards = n;
        self
    }

    pub fn num_short_qa(mut self, n: u32) -> Self {
        self.config.num_short_qa = n;
        self
    }

    pub fn max_context_chars(mut self, n: usize) -> Self {
        self.config.max_context_chars = n;
        self
    }

    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn client(mut self, client: Arc<dyn ModelClient>) -> Self {
        self.config.client = Some(client);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_output_tokens(mut self, n: usize) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn failure_style(mut self, style: FailureStyle) -> Self {
        self.config.failure_style = style;
        self
    }

    pub fn concurrent(mut self, v: bool) -> Self {
        self.config.concurrent = v;
        self
    }

    pub fn render_diagram(mut self, v: bool) -> Self {
        self.config.render_diagram = v;
        self
    }

    pub fn capabilities(mut self, caps: Capabilities) -> Self {
        self.config.capabilities = Some(caps);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Fill backend fields from `STUDY_BACKEND`, `STUDY_MODEL`,
    /// `STUDY_API_KEY` and `STUDY_BASE_URL` when they are set and non-empty.
    ///
    /// Values already set on the builder are overwritten.
    pub fn from_env(mut self) -> Result<Self, StudyError> {
        if let Some(backend) = non_empty_env("STUDY_BACKEND") {
            self.config.backend = backend.parse()?;
        }
        if let Some(model) = non_empty_env("STUDY_MODEL") {
            self.config.model = Some(model);
        }
        if let Some(key) = non_empty_env("STUDY_API_KEY") {
            self.config.api_key = Some(key);
        }
        if let Some(url) = non_empty_env("STUDY_BASE_URL") {
            self.config.base_url = Some(url);
        }
        Ok(self)
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<StudyConfig, StudyError> {
        let c = &self.config;
        check_range("num_bullets", c.num_bullets, BULLETS_RANGE)?;
        check_range("num_flashcards", c.num_flashcards, FLASHCARDS_RANGE)?;
        check_range("num_short_qa", c.num_short_qa, SHORT_QA_RANGE)?;
        if c.max_context_chars == 0 {
            return Err(StudyError::InvalidConfig(
                "max_context_chars must be ≥ 1".into(),
            ));
        }
        if c.max_output_tokens == 0 {
            return Err(StudyError::InvalidConfig(
                "max_output_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

fn check_range(name: &str, value: u32, (lo, hi): (u32, u32)) -> Result<(), StudyError> {
    if value < lo || value > hi {
        return Err(StudyError::InvalidConfig(format!(
            "{name} must be {lo}–{hi}, got {value}"
        )));
    }
    Ok(())
}

pub(crate) fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Remote text-generation backend.
///
/// The backends differ in wire format and in the response field holding the
/// generated text; all of them are reduced to "prompt in, text out" by
/// [`crate::client::ModelClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackendKind {
    /// Google Gemini `generateContent`. Text at `candidates[].content.parts[].text`. (default)
    #[default]
    Gemini,
    /// OpenAI-compatible `chat/completions`. Text at `choices[0].message.content`.
    OpenAi,
    /// Any provider known to `edgequake-llm`'s `ProviderFactory`.
    Provider,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Gemini => "gemini",
            BackendKind::OpenAi => "openai",
            BackendKind::Provider => "provider",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = StudyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(BackendKind::Gemini),
            "openai" | "openai-compatible" => Ok(BackendKind::OpenAi),
            "provider" | "edgequake" => Ok(BackendKind::Provider),
            other => Err(StudyError::InvalidConfig(format!(
                "unknown backend '{other}' (expected gemini, openai or provider)"
            ))),
        }
    }
}

/// What a failed model call leaves in its artifact text.
///
/// The failure itself is always recorded as an
/// [`crate::error::ArtifactError::RemoteCallFailed`]; this only controls the
/// text shown in place of the generated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailureStyle {
    /// Empty string. (default)
    #[default]
    Empty,
    /// `"[generation failed] <detail>"`.
    Diagnostic,
}

/// Optional backends available in this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// pdfium shared library can be bound.
    pub pdfium: bool,
    /// lopdf text extraction is enabled.
    pub lopdf: bool,
    /// Graphviz `dot` executable is on the PATH.
    pub graphviz: bool,
}

static DETECTED: Lazy<Capabilities> = Lazy::new(Capabilities::detect);

impl Capabilities {
    /// Probe the environment. Spawns `dot -V` and tries to bind pdfium.
    pub fn detect() -> Self {
        let caps = Self {
            pdfium: extract::pdfium_available(),
            lopdf: true,
            graphviz: render::graphviz_available(),
        };
        tracing::debug!(
            "Capabilities: pdfium={} lopdf={} graphviz={}",
            caps.pdfium,
            caps.lopdf,
            caps.graphviz
        );
        caps
    }

    /// Process-wide capabilities, probed on first use only.
    pub fn detected() -> Self {
        *DETECTED
    }

    /// Nothing optional available: extraction yields "" and no diagram is rendered.
    pub fn none() -> Self {
        Self {
            pdfium: false,
            lopdf: false,
            graphviz: false,
        }
    }

    /// Only the pure-Rust extractor; no external programs or libraries.
    pub fn pure_rust() -> Self {
        Self {
            pdfium: false,
            lopdf: true,
            graphviz: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const STUDY_VARS: [&str; 4] = [
        "STUDY_BACKEND",
        "STUDY_MODEL",
        "STUDY_API_KEY",
        "STUDY_BASE_URL",
    ];

    // The environment is process-global; env tests take this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn with_study_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for name in STUDY_VARS {
            std::env::remove_var(name);
        }
        for (name, value) in vars {
            std::env::set_var(name, value);
        }
        let out = f();
        for name in STUDY_VARS {
            std::env::remove_var(name);
        }
        out
    }

    #[test]
    fn defaults_match_slider_defaults() {
        let c = StudyConfig::default();
        assert_eq!(c.num_bullets, 5);
        assert_eq!(c.num_flashcards, 10);
        assert_eq!(c.num_short_qa, 8);
        assert_eq!(c.max_context_chars, 60_000);
        assert_eq!(c.failure_style, FailureStyle::Empty);
        assert!(c.concurrent);
    }

    #[test]
    fn build_rejects_out_of_range_counts() {
        assert!(StudyConfig::builder().num_bullets(2).build().is_err());
        assert!(StudyConfig::builder().num_bullets(11).build().is_err());
        assert!(StudyConfig::builder().num_flashcards(31).build().is_err());
        assert!(StudyConfig::builder().num_short_qa(21).build().is_err());
        assert!(StudyConfig::builder()
            .num_bullets(10)
            .num_flashcards(3)
            .num_short_qa(20)
            .build()
            .is_ok());
    }

    #[test]
    fn build_rejects_zero_context() {
        let err = StudyConfig::builder()
            .max_context_chars(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_context_chars"));
    }

    #[test]
    fn temperature_is_clamped() {
        let c = StudyConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = StudyConfig::builder().api_key("sk-secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn backend_kind_parses() {
        assert_eq!("gemini".parse::<BackendKind>().unwrap(), BackendKind::Gemini);
        assert_eq!("OpenAI".parse::<BackendKind>().unwrap(), BackendKind::OpenAi);
        assert_eq!(
            "provider".parse::<BackendKind>().unwrap(),
            BackendKind::Provider
        );
        assert!("bard".parse::<BackendKind>().is_err());
    }

    #[test]
    fn explicit_capabilities_win() {
        let c = StudyConfig::builder()
            .capabilities(Capabilities::none())
            .build()
            .unwrap();
        assert_eq!(c.effective_capabilities(), Capabilities::none());
    }

    #[test]
    fn from_env_reads_study_variables() {
        let c = with_study_env(
            &[
                ("STUDY_BACKEND", "openai"),
                ("STUDY_MODEL", "gpt-4o-mini"),
                ("STUDY_API_KEY", "sk-env"),
                ("STUDY_BASE_URL", "http://localhost:8080/v1"),
            ],
            StudyConfig::from_env,
        )
        .unwrap();
        assert_eq!(c.backend, BackendKind::OpenAi);
        assert_eq!(c.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(c.api_key.as_deref(), Some("sk-env"));
        assert_eq!(c.base_url.as_deref(), Some("http://localhost:8080/v1"));
    }

    #[test]
    fn from_env_overrides_builder_values() {
        let c = with_study_env(&[("STUDY_MODEL", "gemini-2.5-pro")], || {
            StudyConfig::builder()
                .model("gemini-2.0-flash")
                .api_key("kept")
                .from_env()?
                .build()
        })
        .unwrap();
        assert_eq!(c.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(c.api_key.as_deref(), Some("kept"));
    }

    #[test]
    fn from_env_ignores_blank_values() {
        let c = with_study_env(
            &[("STUDY_BACKEND", "  "), ("STUDY_API_KEY", "")],
            StudyConfig::from_env,
        )
        .unwrap();
        assert_eq!(c.backend, BackendKind::Gemini);
        assert!(c.api_key.is_none());
    }

    #[test]
    fn from_env_rejects_unknown_backend() {
        let err = with_study_env(&[("STUDY_BACKEND", "bard")], StudyConfig::from_env).unwrap_err();
        assert!(matches!(err, StudyError::InvalidConfig(_)));
        assert!(err.to_string().contains("bard"));
    }
}
