//! `edgequake-llm` backend: any provider its `ProviderFactory` can build.
//!
//! This is the escape hatch for providers without a dedicated client here
//! (Anthropic, Mistral, Azure, Ollama, …). The factory reads each provider's
//! own API-key variable.

use super::{GenerationOptions, ModelClient, DEFAULT_PROVIDER_MODEL};
use crate::config::{non_empty_env, StudyConfig};
use crate::error::{ClientError, StudyError};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::debug;

/// Wraps an `edgequake-llm` provider as a [`ModelClient`].
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    label: String,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
        }
    }

    /// Build the provider from config, then environment.
    ///
    /// 1. `config.provider_name` (+ `config.model`)
    /// 2. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, both set
    /// 3. `ProviderFactory::from_env()` auto-detection
    pub fn resolve(config: &StudyConfig) -> Result<Self, StudyError> {
        if let Some(ref name) = config.provider_name {
            let model = config.model.as_deref().unwrap_or(DEFAULT_PROVIDER_MODEL);
            return Self::named(name, model);
        }

        if let (Some(prov), Some(model)) = (
            non_empty_env("EDGEQUAKE_LLM_PROVIDER"),
            non_empty_env("EDGEQUAKE_MODEL"),
        ) {
            return Self::named(&prov, &model);
        }

        let (llm_provider, _embedding) =
            ProviderFactory::from_env().map_err(|e| StudyError::ClientNotConfigured {
                backend: "provider".to_string(),
                hint: format!(
                    "No LLM provider could be auto-detected from environment.\n\
                    Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or EDGEQUAKE_LLM_PROVIDER.\n\
                    Error: {}",
                    e
                ),
            })?;

        Ok(Self::new(llm_provider, "provider:auto"))
    }

    fn named(name: &str, model: &str) -> Result<Self, StudyError> {
        let provider = ProviderFactory::create_llm_provider(name, model).map_err(|e| {
            StudyError::ClientNotConfigured {
                backend: name.to_string(),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self::new(provider, format!("provider:{name}:{model}")))
    }
}

#[async_trait]
impl ModelClient for ProviderClient {
    fn name(&self) -> String {
        self.label.clone()
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, ClientError> {
        let messages = build_messages(prompt);
        let completion = build_options(options);

        let response = self
            .provider
            .chat(&messages, Some(&completion))
            .await
            .map_err(|e| ClientError::Transport(format!("{}", e)))?;

        debug!(
            "{}: {} input tokens, {} output tokens",
            self.label, response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

fn build_messages(prompt: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(prompt)]
}

fn build_options(options: &GenerationOptions) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(options.temperature),
        max_tokens: Some(options.max_output_tokens),
        ..Default::default()
    }
}
