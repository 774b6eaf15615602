//! OpenAI-compatible backend (`POST {base}/chat/completions`).
//!
//! Works against api.openai.com and any server speaking the same protocol
//! (Ollama, vLLM, LM Studio, LiteLLM). Self-hosted servers usually take no
//! key, so the bearer header is only sent when one is configured.

use super::{post_json, GenerationOptions, ModelClient};
use crate::error::ClientError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat-completions client.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model: model.into(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    fn name(&self) -> String {
        format!("openai:{}", self.model)
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, ClientError> {
        let body = build_request(&self.model, prompt, options);
        let mut request = self.http.post(self.endpoint());
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let text = post_json(request, &body).await?;
        let content = parse_response(&text)?;
        debug!("openai: {} chars back", content.len());
        Ok(content)
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

fn build_request<'a>(
    model: &'a str,
    prompt: &'a str,
    options: &GenerationOptions,
) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: prompt,
        }],
        max_tokens: options.max_output_tokens,
        temperature: options.temperature,
    }
}

fn parse_response(body: &str) -> Result<String, ClientError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| ClientError::MalformedResponse(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or(ClientError::MissingField("choices[0].message.content"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let opts = GenerationOptions {
            max_output_tokens: 256,
            temperature: 0.0,
        };
        let json = serde_json::to_value(build_request("gpt-4o-mini", "hi", &opts)).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
        assert_eq!(json["max_tokens"], 256);
        assert_eq!(json["temperature"], 0.0);
    }

    #[test]
    fn parses_first_choice() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Q: a\nA: b"},"finish_reason":"stop"}]}"#;
        assert_eq!(parse_response(body).unwrap(), "Q: a\nA: b");
    }

    #[test]
    fn null_content_is_missing_field() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert_eq!(
            parse_response(body).unwrap_err(),
            ClientError::MissingField("choices[0].message.content")
        );
    }

    #[test]
    fn empty_choices_is_missing_field() {
        assert!(matches!(
            parse_response(r#"{"choices":[]}"#),
            Err(ClientError::MissingField(_))
        ));
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let c = OpenAiClient::new(None, "m").with_base_url("http://localhost:8000/v1/");
        assert_eq!(c.endpoint(), "http://localhost:8000/v1/chat/completions");
    }
}
