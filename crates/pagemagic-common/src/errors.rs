use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),

    #[error("OpenRouter API key not configured. Please check settings.")]
    MissingApiKey,

    #[error("No model selected. Please select a model in settings.")]
    MissingModel,

    #[error("invalid API key: {0}")]
    InvalidApiKey(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage read error: {0}")]
    Read(String),

    #[error("storage write error: {0}")]
    Write(String),

    #[error("storage decode error for `{key}`: {message}")]
    Decode { key: String, message: String },

    #[error("storage encode error for `{key}`: {message}")]
    Encode { key: String, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("no page context available for tab {0}")]
    NoReceiver(u32),

    #[error("page rejected `{action}`: {message}")]
    Rejected { action: String, message: String },

    #[error("malformed page response: {0}")]
    Protocol(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PageMagicError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Messaging(#[from] MessagingError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid page url: {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    Ai(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ValidationError("max_tokens must be positive".into());
        assert_eq!(
            err.to_string(),
            "config validation error: max_tokens must be positive"
        );

        assert!(ConfigError::MissingApiKey
            .to_string()
            .contains("API key not configured"));
        assert!(ConfigError::MissingModel.to_string().contains("No model selected"));
    }

    #[test]
    fn storage_error_display() {
        let err = StorageError::Decode {
            key: "pagemagic_css_https://a.com".into(),
            message: "expected array".into(),
        };
        assert_eq!(
            err.to_string(),
            "storage decode error for `pagemagic_css_https://a.com`: expected array"
        );
    }

    #[test]
    fn messaging_error_display() {
        let err = MessagingError::NoReceiver(7);
        assert_eq!(err.to_string(), "no page context available for tab 7");

        let err = MessagingError::Rejected {
            action: "injectCSS".into(),
            message: "head missing".into(),
        };
        assert_eq!(err.to_string(), "page rejected `injectCSS`: head missing");
    }

    #[test]
    fn pagemagic_error_from_config() {
        let err: PageMagicError = ConfigError::ParseError("bad toml".into()).into();
        assert!(matches!(err, PageMagicError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn pagemagic_error_from_storage() {
        let err: PageMagicError = StorageError::Write("disk full".into()).into();
        assert!(matches!(err, PageMagicError::Storage(_)));
        assert_eq!(err.to_string(), "storage write error: disk full");
    }

    #[test]
    fn pagemagic_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: PageMagicError = io_err.into();
        assert!(matches!(err, PageMagicError::Io(_)));
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn pagemagic_error_other_variants() {
        let err = PageMagicError::InvalidUrl("chrome://extensions".into());
        assert_eq!(err.to_string(), "invalid page url: chrome://extensions");

        let err = PageMagicError::Other("something went wrong".into());
        assert_eq!(err.to_string(), "something went wrong");
    }
}
