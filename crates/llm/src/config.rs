use std::sync::Arc;

use serde::{Deserialize, Serialize};
use switchboard_common::{Result, SwitchboardError};
use tracing::info;

use crate::client::LlmClient;
use crate::openai::{OpenAiClient, DEFAULT_BASE_URL};

/// Environment variable overriding `api_url`.
pub const ENV_LLM_URL: &str = "SWITCHBOARD_LLM_URL";
/// Environment variable overriding `model`.
pub const ENV_MODEL: &str = "SWITCHBOARD_MODEL";
/// Environment variables consulted, in order, when no `api_key` is configured.
pub const ENV_API_KEYS: &[&str] = &["SWITCHBOARD_API_KEY", "OPENAI_API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_provider() -> String {
    "openai".into()
}

fn default_model() -> String {
    "qwen3-32b".into()
}

fn default_api_url() -> Option<String> {
    Some(DEFAULT_BASE_URL.into())
}

fn default_temperature() -> Option<f32> {
    Some(0.7)
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            api_url: default_api_url(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from config or environment variables.
    ///
    /// Priority:
    /// 1. Explicit, non-empty `api_key` in config
    /// 2. `SWITCHBOARD_API_KEY`
    /// 3. `OPENAI_API_KEY`
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    fn resolve_api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }

        ENV_API_KEYS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|key| !key.is_empty())
    }

    /// Override `api_url` and `model` from the environment when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|name| std::env::var(name).ok());
    }

    fn apply_overrides_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_LLM_URL).filter(|v| !v.is_empty()) {
            self.api_url = Some(url);
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.is_empty()) {
            self.model = model;
        }
    }
}

pub fn build_llm_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    match config.provider.as_str() {
        "openai" => {
            info!(
                model = %config.model,
                api_url = config.api_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
                "Building OpenAI-compatible LLM client"
            );
            let client = OpenAiClient::new(
                config.api_url.clone(),
                config.model.clone(),
                config.resolve_api_key(),
            )
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens);
            Ok(Arc::new(client))
        }
        other => Err(SwitchboardError::Config(format!(
            "Unknown LLM provider: {other}"
        ))),
    }
}
