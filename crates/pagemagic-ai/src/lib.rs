//! Remote model client for PageMagic.
//!
//! Turns a page's HTML and a natural-language request into CSS:
//! - OpenRouter chat-completions client with model listing
//! - CSS extraction from free-form model output
//! - Usage tracking per day and in total, keyed by model id

pub mod extract;
pub mod models;
pub mod openrouter;
pub mod prompt;
pub mod service;
pub mod usage;

use async_trait::async_trait;
use pagemagic_common::{ConfigError, PageMagicError, StorageError};

pub use extract::extract_css;
pub use models::ModelInfo;
pub use openrouter::{Credentials, OpenRouterClient, OpenRouterConfig};
pub use service::CssService;
pub use usage::UsageTracker;

/// Anything that can produce CSS for a page.
#[async_trait]
pub trait CssGenerator: Send + Sync {
    async fn generate_css(&self, html: &str, prompt: &str) -> Result<CssGeneration, AiError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Result of one successful generation.
#[derive(Debug, Clone, PartialEq)]
pub struct CssGeneration {
    pub css: String,
    pub model: String,
    pub usage: TokenUsage,
    /// USD, 0 for free models.
    pub cost: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Authentication failed (401). Check your OpenRouter API key. Details: {0}")]
    AuthFailed(String),

    #[error("Rate limit exceeded (429) for model {model}. Details: {detail}")]
    RateLimited { model: String, detail: String },

    #[error("API request failed with status {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("Failed to fetch models ({status}): {detail}")]
    Models { status: u16, detail: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response structure from OpenRouter API")]
    InvalidResponse,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<AiError> for PageMagicError {
    fn from(err: AiError) -> Self {
        match err {
            AiError::Config(e) => PageMagicError::Config(e),
            AiError::Storage(e) => PageMagicError::Storage(e),
            other => PageMagicError::Ai(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_keeps_config_errors_typed() {
        let err: PageMagicError = AiError::Config(ConfigError::MissingApiKey).into();
        assert!(matches!(err, PageMagicError::Config(ConfigError::MissingApiKey)));

        let err: PageMagicError = AiError::RateLimited {
            model: "m".into(),
            detail: "slow down".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Rate limit exceeded (429) for model m. Details: slow down"
        );
    }
}
