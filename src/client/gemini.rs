//! Google Gemini backend (`models/{model}:generateContent`).
//!
//! The API key travels in the `x-goog-api-key` header, never in the URL, so
//! it cannot leak through request logs.

use super::{post_json, GenerationOptions, ModelClient};
use crate::error::ClientError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini REST client.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    fn name(&self) -> String {
        format!("gemini:{}", self.model)
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, ClientError> {
        let body = build_request(prompt, options);
        let request = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key);

        let text = post_json(request, &body).await?;
        let content = parse_response(&text)?;
        debug!("gemini: {} chars back", content.len());
        Ok(content)
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: usize,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

fn build_request<'a>(prompt: &'a str, options: &GenerationOptions) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: vec![RequestContent {
            role: "user",
            parts: vec![RequestPart { text: prompt }],
        }],
        generation_config: GenerationConfig {
            max_output_tokens: options.max_output_tokens,
            temperature: options.temperature,
        },
    }
}

/// Concatenate the text parts of the first candidate.
fn parse_response(body: &str) -> Result<String, ClientError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| ClientError::MalformedResponse(e.to_string()))?;

    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    let texts: Vec<String> = parts.into_iter().filter_map(|p| p.text).collect();
    if texts.is_empty() {
        return Err(ClientError::MissingField("candidates[0].content.parts[].text"));
    }
    Ok(texts.concat())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let opts = GenerationOptions {
            max_output_tokens: 1024,
            temperature: 0.5,
        };
        let json = serde_json::to_value(build_request("hello", &opts)).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn parses_candidate_text() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"- a\n"},{"text":"- b"}]},"finishReason":"STOP"}]}"#;
        assert_eq!(parse_response(body).unwrap(), "- a\n- b");
    }

    #[test]
    fn blocked_prompt_has_no_text() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert_eq!(
            parse_response(body).unwrap_err(),
            ClientError::MissingField("candidates[0].content.parts[].text")
        );
    }

    #[test]
    fn garbage_body_is_malformed() {
        assert!(matches!(
            parse_response("<html>oops</html>"),
            Err(ClientError::MalformedResponse(_))
        ));
    }

    #[test]
    fn endpoint_joins_base_and_model() {
        let c = GeminiClient::new("k", "gemini-1.5-flash").with_base_url("http://proxy/v1beta/");
        assert_eq!(
            c.endpoint(),
            "http://proxy/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
