//! Network calls: chat completion and model listing.

use tracing::{debug, warn};

use super::client::{error_detail, Completion, OpenRouterClient};
use super::config::Credentials;
use crate::models::{free_models, ModelInfo};
use crate::AiError;

impl OpenRouterClient {
    /// Ask the model for CSS implementing `prompt` on a page with `html`.
    pub async fn complete(
        &self,
        creds: &Credentials,
        html: &str,
        prompt: &str,
    ) -> Result<Completion, AiError> {
        let body = self.build_request_body(creds, html, prompt);

        debug!(model = %creds.model, html_len = html.len(), "OpenRouter completion request");

        let response = self
            .http
            .post(self.config.chat_url())
            .headers(self.headers(&creds.api_key)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = error_detail(&text, status);
            warn!(status = status.as_u16(), %detail, "OpenRouter API error");
            return Err(match status.as_u16() {
                401 => AiError::AuthFailed(detail),
                429 => AiError::RateLimited {
                    model: creds.model.clone(),
                    detail,
                },
                code => AiError::Api { status: code, detail },
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|_| AiError::InvalidResponse)?;

        self.parse_response(&json)
    }

    /// Free models available to `api_key`, sorted by display name.
    pub async fn list_models(&self, api_key: &str) -> Result<Vec<ModelInfo>, AiError> {
        debug!("OpenRouter models request");

        let response = self
            .http
            .get(self.config.models_url())
            .headers(self.headers(api_key)?)
            .send()
            .await
            .map_err(|e| AiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = error_detail(&text, status);
            warn!(status = status.as_u16(), %detail, "OpenRouter models error");
            return Err(AiError::Models {
                status: status.as_u16(),
                detail,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|_| AiError::InvalidResponse)?;
        let data = json["data"].as_array().ok_or(AiError::InvalidResponse)?;

        let models = free_models(data);
        debug!(available = data.len(), free = models.len(), "models listed");
        Ok(models)
    }
}
