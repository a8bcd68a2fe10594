//! OpenRouter client configuration.

use std::fmt;
use std::time::Duration;

use pagemagic_config::ApiConfig;

/// Endpoint and request settings, taken from the `[api]` config section.
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub base_url: String,
    pub max_tokens: u32,
    pub referer: Option<String>,
    pub app_title: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for OpenRouterConfig {
    fn from(api: &ApiConfig) -> Self {
        Self {
            base_url: api.base_url.trim_end_matches('/').to_string(),
            max_tokens: api.max_tokens,
            referer: api.referer.clone(),
            app_title: api.app_title.clone(),
            connect_timeout: Duration::from_secs(api.connect_timeout_secs),
            request_timeout: Duration::from_secs(api.request_timeout_secs),
        }
    }
}

impl OpenRouterConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub fn models_url(&self) -> String {
        format!("{}/models", self.base_url)
    }
}

/// API key and model for one request.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub model: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}
