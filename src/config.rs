//! Configuration for the endpoint, retry schedule, pacing, and evaluation.

use crate::llm::RetryPolicy;
use crate::log_debug;
use crate::vocabulary::ThemeVocabulary;

use anyhow::{Context, Result, anyhow};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Environment override for the API key; never stored in the config file by
/// `config --api-key` unless explicitly saved.
pub const API_KEY_ENV: &str = "THEME_EXTRACT_API_KEY";
/// Environment override for the endpoint base URL.
pub const BASE_URL_ENV: &str = "THEME_EXTRACT_BASE_URL";
/// Environment override for the model name.
pub const MODEL_ENV: &str = "THEME_EXTRACT_MODEL";

/// Top-level configuration.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
    /// Completion endpoint settings
    #[serde(default)]
    pub endpoint: EndpointConfig,
    /// Retry schedule for transport failures
    #[serde(default)]
    pub retry: RetryConfig,
    /// Pause between successive LLM calls, in milliseconds
    #[serde(default = "default_call_delay_ms")]
    pub call_delay_ms: u64,
    /// Drop the "unknown" sentinel from predictions before scoring
    #[serde(default)]
    pub exclude_sentinel: bool,
    /// Override the built-in theme vocabulary
    #[serde(default)]
    pub themes: Vec<String>,
}

/// Completion endpoint settings.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct EndpointConfig {
    /// OpenAI-compatible base URL, e.g. `http://localhost:8001/v1`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token; empty for local endpoints
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Per-call request timeout, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Retry schedule settings.
#[derive(Deserialize, Serialize, Clone, Copy, Debug)]
pub struct RetryConfig {
    /// Total attempts per call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8001/v1".to_string()
}

fn default_model() -> String {
    "meta-llama/Llama-3.2-3B-Instruct".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_call_delay_ms() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            retry: RetryConfig::default(),
            call_delay_ms: default_call_delay_ms(),
            exclude_sentinel: false,
            themes: Vec::new(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

/// Config filename under the user's config directory.
const CONFIG_DIR_NAME: &str = "theme-extract";
const CONFIG_FILE_NAME: &str = "config.toml";

impl Config {
    /// Loads the configuration file if present, otherwise defaults, then
    /// applies environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read '{}'", config_path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("invalid configuration in '{}'", config_path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        log_debug!("configuration loaded: {:?}", config);
        Ok(config)
    }

    /// Writes the configuration to the config file.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content)
            .with_context(|| format!("failed to write '{}'", config_path.display()))?;
        log_debug!("configuration saved to '{}'", config_path.display());
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let mut path =
            config_dir().ok_or_else(|| anyhow!("unable to determine config directory"))?;
        path.push(CONFIG_DIR_NAME);
        fs::create_dir_all(&path)?;
        path.push(CONFIG_FILE_NAME);
        Ok(path)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.is_empty()
        {
            self.endpoint.api_key = key;
        }
        if let Ok(base_url) = std::env::var(BASE_URL_ENV)
            && !base_url.is_empty()
        {
            self.endpoint.base_url = base_url;
        }
        if let Ok(model) = std::env::var(MODEL_ENV)
            && !model.is_empty()
        {
            self.endpoint.model = model;
        }
    }

    /// Rejects configurations the client cannot run with.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.endpoint.base_url)
            .with_context(|| format!("invalid base URL '{}'", self.endpoint.base_url))?;

        if !(0.0..=2.0).contains(&self.endpoint.temperature) {
            return Err(anyhow!(
                "temperature must be between 0 and 2, got {}",
                self.endpoint.temperature
            ));
        }
        if self.endpoint.max_tokens == 0 {
            return Err(anyhow!("max_tokens must be at least 1"));
        }
        if self.endpoint.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(anyhow!("retry.max_attempts must be at least 1"));
        }
        Ok(())
    }

    /// The run's theme vocabulary: configured override or the built-in list.
    pub fn vocabulary(&self) -> ThemeVocabulary {
        if self.themes.is_empty() {
            ThemeVocabulary::default()
        } else {
            ThemeVocabulary::new(self.themes.iter().map(String::as_str))
        }
    }

    pub fn call_delay(&self) -> Duration {
        Duration::from_millis(self.call_delay_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay_ms: self.retry.base_delay_ms,
        }
    }
}
