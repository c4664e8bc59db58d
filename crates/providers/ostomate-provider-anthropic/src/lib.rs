//! Anthropic (Claude) entry-extraction model for ostomate
//!
//! Sends the rendered extraction prompt to the Messages API and hands the
//! JSON reply back to the extractor, which validates its shape.

#![warn(missing_docs)]
#![warn(clippy::all)]

use async_trait::async_trait;
use ostomate_core::{
    get_env_opt, get_env_or, render_extraction_prompt, EntryModel, ExtractionRequest,
    OstomateError, Result,
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Shared HTTP client for connection pooling
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

/// Get or initialize the shared HTTP client
fn get_http_client() -> Client {
    HTTP_CLIENT
        .get_or_init(|| {
            Client::builder()
                .pool_max_idle_per_host(10)
                .pool_idle_timeout(Duration::from_secs(300))
                .tcp_keepalive(Duration::from_secs(60))
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default()
        })
        .clone()
}

/// Client settings
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key sent as `x-api-key`
    pub api_key: String,
    /// Model name
    pub model: String,
    /// API root, without trailing slash
    pub base_url: String,
    /// Upper bound on reply length
    pub max_tokens: usize,
}

impl AnthropicConfig {
    /// Settings with default model and API root
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: 2048,
        }
    }

    /// Read `ANTHROPIC_API_KEY`, `ANTHROPIC_MODEL` and `ANTHROPIC_BASE_URL`.
    ///
    /// Returns `None` without a key; extraction then runs locally only.
    pub fn from_env() -> Option<Self> {
        let api_key = get_env_opt("ANTHROPIC_API_KEY").filter(|k| !k.trim().is_empty())?;
        Some(Self {
            model: get_env_or("ANTHROPIC_MODEL", DEFAULT_MODEL),
            base_url: get_env_or("ANTHROPIC_BASE_URL", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            ..Self::new(api_key)
        })
    }
}

/// Anthropic API client
pub struct AnthropicClient {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    /// Create a new Anthropic client with shared connection pool
    pub fn new(config: AnthropicConfig) -> Self {
        Self {
            client: get_http_client(),
            config,
        }
    }

    /// Create a client when a key is configured
    pub fn from_env() -> Option<Self> {
        AnthropicConfig::from_env().map(Self::new)
    }

    /// Model this client talks to
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send one user message and return the concatenated text reply
    pub async fn generate_text(&self, prompt: String) -> Result<(String, Option<AnthropicUsage>)> {
        let request = AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: Some(0.0),
        };

        let resp = self
            .client
            .post(format!("{}/messages", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| OstomateError::model(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(OstomateError::rate_limit("Anthropic messages"));
        }
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(OstomateError::model(format!(
                "Anthropic API error ({}): {}",
                status, error_text
            )));
        }

        let body: AnthropicResponse = resp.json().await?;
        let text = body
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("");
        Ok((text, body.usage))
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: usize,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContent>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

/// Token accounting reported with each reply
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AnthropicUsage {
    /// Prompt tokens
    pub input_tokens: usize,
    /// Reply tokens
    pub output_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: String,
    #[serde(rename = "type")]
    content_type: String,
}

#[async_trait]
impl EntryModel for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn extract_entries(&self, request: &ExtractionRequest) -> Result<Value> {
        let prompt = render_extraction_prompt(request)?;
        let (text, usage) = self.generate_text(prompt).await?;
        if let Some(usage) = usage {
            debug!(
                model = %self.config.model,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "anthropic extraction reply"
            );
        }
        parse_reply(&text)
    }
}

/// Pull the JSON document out of a reply, tolerating code fences and prose
fn parse_reply(text: &str) -> Result<Value> {
    let trimmed = strip_fences(text.trim());
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    // Fall back to the outermost bracketed span
    let start = trimmed.find(['{', '[']);
    let end = trimmed.rfind(['}', ']']);
    match (start, end) {
        (Some(s), Some(e)) if e > s => serde_json::from_str(&trimmed[s..=e])
            .map_err(|err| OstomateError::malformed("anthropic", err.to_string())),
        _ => Err(OstomateError::malformed("anthropic", "reply contains no JSON")),
    }
}

fn strip_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_and_fenced_replies() {
        let plain = r#"{"entries": []}"#;
        assert_eq!(parse_reply(plain).unwrap(), json!({"entries": []}));

        let fenced = "```json\n[{\"category\": \"snack\"}]\n```";
        assert_eq!(parse_reply(fenced).unwrap(), json!([{"category": "snack"}]));

        let chatty = "Here you go:\n{\"entries\": [{\"category\": \"output\"}]}\nThanks!";
        assert_eq!(
            parse_reply(chatty).unwrap()["entries"][0]["category"],
            "output"
        );
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let err = parse_reply("I could not find anything.").unwrap_err();
        assert!(matches!(err, OstomateError::MalformedResponse { .. }));
        assert!(parse_reply("{ broken").is_err());
    }

    #[test]
    fn test_response_text_blocks_deserialize() {
        let body: AnthropicResponse = serde_json::from_value(json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "model": DEFAULT_MODEL,
            "content": [{"type": "text", "text": "{\"entries\": []}"}],
            "usage": {"input_tokens": 412, "output_tokens": 9}
        }))
        .unwrap();
        assert_eq!(body.content[0].text, "{\"entries\": []}");
        assert_eq!(body.usage.unwrap().output_tokens, 9);
    }

    #[test]
    fn test_client_name_and_model() {
        let client = AnthropicClient::new(AnthropicConfig::new("test_key"));
        assert_eq!(EntryModel::name(&client), "anthropic");
        assert_eq!(client.model(), DEFAULT_MODEL);
    }
}
