//! Configuration validation.
//!
//! Collects every problem into a single `ConfigError::ValidationError`.

use pagemagic_common::ConfigError;

use crate::schema::PageMagicConfig;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &PageMagicConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_api(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_api(errors: &mut Vec<String>, config: &PageMagicConfig) {
    let api = &config.api;

    match url::Url::parse(&api.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(format!(
            "api.base_url scheme '{}' is not http or https",
            url.scheme()
        )),
        Err(e) => errors.push(format!("api.base_url '{}' is not a valid URL: {e}", api.base_url)),
    }

    validate_range(errors, "api.max_tokens", u64::from(api.max_tokens), 1, 32_768);
    validate_range(errors, "api.connect_timeout_secs", api.connect_timeout_secs, 1, 120);
    validate_range(errors, "api.request_timeout_secs", api.request_timeout_secs, 1, 600);

    if api.app_title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        errors.push("api.app_title must not be blank".into());
    }
}

/// Push an error if `value` is outside `[min, max]`.
fn validate_range(errors: &mut Vec<String>, name: &str, value: u64, min: u64, max: u64) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}
