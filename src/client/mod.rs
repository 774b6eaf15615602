//! Model clients: send one prompt, get one text back.
//!
//! The supported generation APIs keep the generated text under different
//! response fields. All of them are hidden behind [`ModelClient`], so the
//! pipeline never knows which backend answered:
//!
//! | Backend | Module | Text field |
//! |---------|--------|------------|
//! | Gemini `generateContent` | [`gemini`] | `candidates[0].content.parts[].text` |
//! | OpenAI-compatible `chat/completions` | [`openai`] | `choices[0].message.content` |
//! | any `edgequake-llm` provider | [`provider`] | `LLMResponse::content` |
//!
//! Clients make exactly one request per call: no retry, no backoff and no
//! timeout beyond the HTTP transport default. Turning a [`ClientError`] into
//! a visible artifact diagnostic is [`crate::pipeline::llm`]'s job.

pub mod gemini;
pub mod openai;
pub mod provider;

use crate::config::{non_empty_env, BackendKind, StudyConfig};
use crate::error::{ClientError, StudyError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use provider::ProviderClient;

/// Default model per backend.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_PROVIDER_MODEL: &str = "gpt-4.1-nano";

/// Generation limits sent with every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub max_output_tokens: usize,
    pub temperature: f32,
}

impl GenerationOptions {
    pub fn from_config(config: &StudyConfig) -> Self {
        Self {
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
        }
    }
}

/// "Send prompt, receive text."
///
/// Implementations return the backend's text untouched; trimming and failure
/// normalisation happen in the pipeline so every backend behaves the same.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Short label for logs, e.g. `"gemini:gemini-1.5-flash"`.
    fn name(&self) -> String;

    /// Issue a single generation request.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, ClientError>;
}

/// Resolve the model client, from most-specific to least-specific.
///
/// 1. **Pre-built client** (`config.client`) — used as-is (tests, custom middleware).
/// 2. **Configured backend** (`config.backend`) — credential from
///    `config.api_key`, else the backend's environment variable:
///    * Gemini: `GEMINI_API_KEY`, then `GOOGLE_API_KEY`
///    * OpenAI: `OPENAI_API_KEY` (optional when `base_url` points at a
///      self-hosted server)
///    * Provider: `config.provider_name` / `EDGEQUAKE_LLM_PROVIDER`, else
///      `edgequake-llm` auto-detection.
pub fn resolve_client(config: &StudyConfig) -> Result<Arc<dyn ModelClient>, StudyError> {
    if let Some(ref client) = config.client {
        return Ok(Arc::clone(client));
    }

    let client: Arc<dyn ModelClient> = match config.backend {
        BackendKind::Gemini => {
            let key = config
                .api_key
                .clone()
                .or_else(|| non_empty_env("GEMINI_API_KEY"))
                .or_else(|| non_empty_env("GOOGLE_API_KEY"))
                .ok_or_else(|| StudyError::ClientNotConfigured {
                    backend: "gemini".into(),
                    hint: "Set GEMINI_API_KEY (or STUDY_API_KEY / --api-key).".into(),
                })?;
            let model = config.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL);
            let mut client = GeminiClient::new(key, model);
            if let Some(ref url) = config.base_url {
                client = client.with_base_url(url);
            }
            Arc::new(client)
        }
        BackendKind::OpenAi => {
            let key = config
                .api_key
                .clone()
                .or_else(|| non_empty_env("OPENAI_API_KEY"));
            if key.is_none() && config.base_url.is_none() {
                return Err(StudyError::ClientNotConfigured {
                    backend: "openai".into(),
                    hint: "Set OPENAI_API_KEY, or --base-url for a local OpenAI-compatible server."
                        .into(),
                });
            }
            let model = config.model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL);
            let mut client = OpenAiClient::new(key, model);
            if let Some(ref url) = config.base_url {
                client = client.with_base_url(url);
            }
            Arc::new(client)
        }
        BackendKind::Provider => Arc::new(ProviderClient::resolve(config)?),
    };

    debug!("Model client: {}", client.name());
    Ok(client)
}

/// Best human-readable message from an error body.
///
/// Gemini and OpenAI both answer failures with `{"error": {"message": …}}`;
/// anything else is passed through, shortened.
pub(crate) fn api_error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    if let Some(msg) = parsed
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return msg.to_string();
    }
    let trimmed = body.trim();
    if trimmed.chars().count() > 200 {
        let head: String = trimmed.chars().take(199).collect();
        format!("{head}\u{2026}")
    } else {
        trimmed.to_string()
    }
}

/// POST a JSON body and return the response text, mapping transport and
/// status failures to [`ClientError`].
pub(crate) async fn post_json<T: serde::Serialize + ?Sized>(
    request: reqwest::RequestBuilder,
    body: &T,
) -> Result<String, ClientError> {
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;

    if !status.is_success() {
        return Err(ClientError::Http {
            status: status.as_u16(),
            message: api_error_message(&text),
        });
    }
    Ok(text)
}
