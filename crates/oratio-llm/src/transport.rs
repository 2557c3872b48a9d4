//! Transport seam for the LLM call: one bounded prompt in, raw text and a
//! usage record out.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default Gemini model for classification calls.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const MAX_OUTPUT_TOKENS: u32 = 1024;

/// Token usage the provider reported for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// One raw provider reply. A missing usage record counts as zero tokens.
#[derive(Debug, Clone)]
pub struct RawReply {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// Rate-limit or quota pressure; worth retrying after a backoff.
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
}

impl TransportError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// One synchronous classification call against the external model.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<RawReply, TransportError>;
}

// ── Gemini wire types ──

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ReplyContent>,
}

#[derive(Deserialize)]
struct ReplyContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u64,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u64,
}

/// Gemini `generateContent` transport over REST.
pub struct GeminiTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiTransport {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Point the transport at a different endpoint (local test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Transport for GeminiTransport {
    async fn generate(&self, prompt: &str) -> Result<RawReply, TransportError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let resp = self.client.post(&url).json(&request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            if status == StatusCode::TOO_MANY_REQUESTS
                || body.contains("RESOURCE_EXHAUSTED")
                || body.to_lowercase().contains("quota")
            {
                return Err(TransportError::RateLimited(body));
            }
            return Err(TransportError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = resp.json().await?;
        let text: String = parsed
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default();
        let usage = parsed.usage_metadata.map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
        });
        debug!(
            chars = text.len(),
            has_usage = usage.is_some(),
            "generateContent reply received"
        );
        Ok(RawReply { text, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_with_usage_deserialises() {
        let raw = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "{\"has_brexit_relation\": true}"}]}}
            ],
            "usageMetadata": {
                "promptTokenCount": 1200,
                "candidatesTokenCount": 45,
                "totalTokenCount": 1245
            }
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        let usage = parsed.usage_metadata.unwrap();
        assert_eq!(usage.prompt_token_count, 1200);
        assert_eq!(usage.candidates_token_count, 45);
    }

    #[test]
    fn response_without_usage_deserialises() {
        let raw = r#"{"candidates": [{"content": {"parts": [{"text": "hello"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.usage_metadata.is_none());
    }

    #[test]
    fn empty_candidates_yield_empty_text() {
        let raw = r#"{"candidates": []}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default();
        assert!(text.is_empty());
    }

    #[test]
    fn request_serialises_camel_case() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: "prompt" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                max_output_tokens: 1024,
            },
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"generationConfig\""));
        assert!(json.contains("\"maxOutputTokens\":1024"));
    }

    #[test]
    fn base_url_trims_trailing_slash() {
        let transport =
            GeminiTransport::new("key", DEFAULT_MODEL, Duration::from_secs(30))
                .unwrap()
                .with_base_url("http://localhost:8080/");
        assert_eq!(transport.base_url, "http://localhost:8080");
    }
}
