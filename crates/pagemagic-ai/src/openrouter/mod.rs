//! OpenRouter chat-completions client.

mod api;
mod client;
mod config;

pub use client::{Completion, OpenRouterClient};
pub use config::{Credentials, OpenRouterConfig};
