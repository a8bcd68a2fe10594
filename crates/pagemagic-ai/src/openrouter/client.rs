//! OpenRouter client struct, request building, and response parsing.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};

use pagemagic_common::ConfigError;

use super::config::{Credentials, OpenRouterConfig};
use crate::extract::extract_css;
use crate::prompt::{user_message, SYSTEM_PROMPT};
use crate::{AiError, TokenUsage};

/// A parsed chat completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Message content as returned by the model.
    pub content: String,
    pub usage: TokenUsage,
    pub cost: f64,
}

impl Completion {
    pub fn css(&self) -> String {
        extract_css(&self.content)
    }
}

pub struct OpenRouterClient {
    pub(crate) config: OpenRouterConfig,
    pub(crate) http: reqwest::Client,
}

impl OpenRouterClient {
    pub fn new(config: OpenRouterConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AiError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &OpenRouterConfig {
        &self.config
    }

    /// Bearer auth plus the optional attribution headers.
    pub(crate) fn headers(&self, api_key: &str) -> Result<HeaderMap, AiError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
            ConfigError::InvalidApiKey("API key contains characters not allowed in a header".into())
        })?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(value) = self.config.referer.as_deref().and_then(header_value) {
            headers.insert("HTTP-Referer", value);
        }
        if let Some(value) = self.config.app_title.as_deref().and_then(header_value) {
            headers.insert("X-Title", value);
        }
        Ok(headers)
    }

    /// JSON body for `POST /chat/completions`.
    pub(crate) fn build_request_body(&self, creds: &Credentials, html: &str, prompt: &str) -> Value {
        json!({
            "model": creds.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_message(html, prompt) },
            ],
            "max_tokens": self.config.max_tokens,
        })
    }

    /// Parse a successful completion body.
    pub(crate) fn parse_response(&self, json: &Value) -> Result<Completion, AiError> {
        let choice = &json["choices"][0];
        let content = choice["message"]["content"]
            .as_str()
            .filter(|c| !c.is_empty())
            .ok_or(AiError::InvalidResponse)?;

        let usage = TokenUsage {
            prompt_tokens: json["usage"]["prompt_tokens"].as_u64().unwrap_or(0),
            completion_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0),
            total_tokens: json["usage"]["total_tokens"].as_u64().unwrap_or(0),
        };

        Ok(Completion {
            content: content.trim().to_string(),
            cost: response_cost(json, &usage),
            usage,
        })
    }
}

fn header_value(value: &str) -> Option<HeaderValue> {
    if value.is_empty() {
        return None;
    }
    HeaderValue::from_str(value).ok()
}

/// Provider-reported cost, else per-1k-token pricing attached to the
/// choice, else 0.
fn response_cost(json: &Value, usage: &TokenUsage) -> f64 {
    if let Some(cost) = json["usage"]["cost"].as_f64() {
        return cost;
    }

    let pricing = &json["choices"][0]["model_info"]["pricing"];
    match (price(&pricing["prompt"]), price(&pricing["completion"])) {
        (prompt, Some(completion)) if usage.total_tokens > 0 => {
            prompt.unwrap_or(0.0) / 1000.0 * usage.prompt_tokens as f64
                + completion / 1000.0 * usage.completion_tokens as f64
        }
        _ => 0.0,
    }
}

/// Prices arrive as strings or numbers.
fn price(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.parse().ok(),
        other => other.as_f64(),
    }
}

/// `error.message` from an error body, else the status reason.
pub(crate) fn error_detail(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .filter(|m| !m.is_empty())
        .or_else(|| status.canonical_reason().map(String::from))
        .unwrap_or_else(|| "Unknown API error".to_string())
}
