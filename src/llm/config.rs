//! Completion endpoint configuration

use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.chatanywhere.tech";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const API_KEY_VARS: &[&str] = &["OPENAI_API_KEY", "DEEPSEEK_API_KEY"];
const MODEL_VARS: &[&str] = &["OPENAI_MODEL", "DEEPSEEK_MODEL"];
const BASE_URL_VARS: &[&str] = &["OPENAI_BASE_URL", "DEEPSEEK_BASE_URL"];

/// Configuration for the chat-completion provider.
///
/// Built once in `main` (see `AppConfig::from_env`) and handed to the
/// client; there is no reload.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Empty when no key is configured; the upstream will reject the call
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl LlmConfig {
    /// Resolve settings through `lookup`. For each setting the OpenAI
    /// variable wins over the DeepSeek one; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|&name| lookup(name))
                .find(|value| !value.is_empty())
        };

        let defaults = Self::default();
        Self {
            api_key: first(API_KEY_VARS).unwrap_or(defaults.api_key),
            model: first(MODEL_VARS).unwrap_or(defaults.model),
            base_url: first(BASE_URL_VARS).unwrap_or(defaults.base_url),
            timeout: defaults.timeout,
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// API key reduced to its first 10 characters, for log output
    pub fn masked_api_key(&self) -> String {
        if self.api_key.is_empty() {
            return "not set".to_string();
        }
        let prefix: String = self.api_key.chars().take(10).collect();
        format!("{prefix}...")
    }

    /// Full URL of the chat-completions endpoint
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
