//! Default config file content with documentation comments.

pub fn default_config_toml() -> &'static str {
    r#"# PageMagic configuration
#
# Every value below is the built-in default. Remove or comment out a line
# to keep the default. The OpenRouter API key and the selected model are
# not stored here: use `pagemagic settings set-key` and
# `pagemagic settings set-model`.

[api]
# OpenAI-compatible chat completions endpoint
base_url = "https://openrouter.ai/api/v1"
# Completion token limit per request (1-32768)
max_tokens = 2048
# Attribution headers sent with every request
referer = "https://github.com/pagemagic/pagemagic"
app_title = "PageMagic"
# Timeouts in seconds
connect_timeout_secs = 10
request_timeout_secs = 120

[storage]
# Directory for sync.json and local.json (default: platform data dir)
# data_dir = "/path/to/pagemagic-data"

[logging]
# trace, debug, info, warn or error (RUST_LOG overrides this)
level = "info"
"#
}
