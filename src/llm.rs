use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use crate::error::{PipelineError, Result};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_DEFAULT_MAX_TOKENS: u32 = 4096;

/// Model settings for one completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionOptions {
    /// Replace the model when an override is given
    pub fn with_model(mut self, model: Option<&str>) -> Self {
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            self.model = model.trim().to_string();
        }
        self
    }
}

/// A language model: prompt in, text out.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str, options: &CompletionOptions) -> Result<String>;
}

fn is_anthropic_model(model: &str) -> bool {
    model.starts_with("claude")
}

/// OpenAI chat completions
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>, timeout: Duration) -> Self {
        OpenAiClient {
            client,
            api_key,
            endpoint: OPENAI_URL.to_string(),
            timeout,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, system: &str, user: &str, options: &CompletionOptions) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            PipelineError::Completion("OPENAI_API_KEY environment variable not set".to_string())
        })?;

        debug!("Completing via OpenAI API with model {}", options.model);

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&openai_body(system, user, options))
            .send()
            .await
            .map_err(|e| PipelineError::Completion(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(PipelineError::Completion(format!("OpenAI API returned {status}: {body}")));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| PipelineError::Completion(e.to_string()))?;
        extract_openai_text(&json)
    }
}

fn openai_body(system: &str, user: &str, options: &CompletionOptions) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model": options.model,
        "messages": [
            {
                "role": "system",
                "content": system
            },
            {
                "role": "user",
                "content": user
            }
        ]
    });
    if let Some(temperature) = options.temperature {
        body["temperature"] = serde_json::json!(temperature);
    }
    if let Some(max_tokens) = options.max_tokens {
        body["max_tokens"] = serde_json::json!(max_tokens);
    }
    body
}

fn extract_openai_text(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .map(|text| text.to_string())
        .ok_or_else(|| PipelineError::Completion("unexpected OpenAI API response format".to_string()))
}

/// Anthropic messages API
#[derive(Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    timeout: Duration,
}

impl AnthropicClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>, timeout: Duration) -> Self {
        AnthropicClient {
            client,
            api_key,
            endpoint: ANTHROPIC_URL.to_string(),
            timeout,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    async fn complete(&self, system: &str, user: &str, options: &CompletionOptions) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            PipelineError::Completion("ANTHROPIC_API_KEY environment variable not set".to_string())
        })?;

        debug!("Completing via Anthropic API with model {}", options.model);

        let resp = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&anthropic_body(system, user, options))
            .send()
            .await
            .map_err(|e| PipelineError::Completion(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(PipelineError::Completion(format!("Anthropic API returned {status}: {body}")));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| PipelineError::Completion(e.to_string()))?;
        extract_anthropic_text(&json)
    }
}

fn anthropic_body(system: &str, user: &str, options: &CompletionOptions) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model": options.model,
        "max_tokens": options.max_tokens.unwrap_or(ANTHROPIC_DEFAULT_MAX_TOKENS),
        "system": system,
        "messages": [
            {
                "role": "user",
                "content": user
            }
        ]
    });
    if let Some(temperature) = options.temperature {
        body["temperature"] = serde_json::json!(temperature);
    }
    body
}

fn extract_anthropic_text(json: &serde_json::Value) -> Result<String> {
    if let Some(content) = json.get("content").and_then(|c| c.as_array()) {
        let text: String = content
            .iter()
            .filter_map(|block| {
                if block.get("type")?.as_str()? == "text" {
                    block.get("text")?.as_str().map(|s| s.to_string())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");
        if !text.is_empty() {
            return Ok(text);
        }
    }
    Err(PipelineError::Completion(
        "unexpected Anthropic API response format".to_string(),
    ))
}

/// Dispatches each call by model name, so a per-request model override can
/// switch providers.
#[derive(Debug, Clone)]
pub struct ModelRouter {
    openai: OpenAiClient,
    anthropic: AnthropicClient,
}

impl ModelRouter {
    pub fn new(openai: OpenAiClient, anthropic: AnthropicClient) -> Self {
        ModelRouter { openai, anthropic }
    }

    /// Keys come from OPENAI_API_KEY / ANTHROPIC_API_KEY; a missing key only
    /// fails calls routed to that provider.
    pub fn from_env(client: reqwest::Client, timeout: Duration) -> Self {
        let openai_key = std::env::var("OPENAI_API_KEY").ok();
        let anthropic_key = std::env::var("ANTHROPIC_API_KEY").ok();
        ModelRouter {
            openai: OpenAiClient::new(client.clone(), openai_key, timeout),
            anthropic: AnthropicClient::new(client, anthropic_key, timeout),
        }
    }
}

#[async_trait]
impl CompletionClient for ModelRouter {
    async fn complete(&self, system: &str, user: &str, options: &CompletionOptions) -> Result<String> {
        if is_anthropic_model(&options.model) {
            self.anthropic.complete(system, user, options).await
        } else {
            self.openai.complete(system, user, options).await
        }
    }
}
