//! Configuration loading.
//!
//! Values come from an optional TOML file, then environment variables
//! override the secrets and the passcode.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{SpiritError, SpiritResult};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "spirit.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiritConfig {
    /// Shared secret that unlocks the quiz (compared case-insensitively).
    pub passcode: String,
    pub anthropic: AnthropicConfig,
    pub openai: OpenAiConfig,
    pub quiz: QuizConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnthropicConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub size: String,
    pub quality: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    /// Delay before a failed generation returns to the first question.
    pub failure_reset_secs: u64,
    /// Sessions untouched for this long are dropped.
    pub session_idle_secs: u64,
    /// Request timeout for provider calls; 0 keeps the HTTP client default.
    pub request_timeout_secs: u64,
    /// Upper bound on live sessions; the least recently used one is evicted.
    pub max_sessions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for SpiritConfig {
    fn default() -> Self {
        Self {
            passcode: "sloan".to_string(),
            anthropic: AnthropicConfig::default(),
            openai: OpenAiConfig::default(),
            quiz: QuizConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "claude-sonnet-4-5-20250929".to_string(),
            max_tokens: 1024,
            base_url: "https://api.anthropic.com".to_string(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
            quality: "standard".to_string(),
            base_url: "https://api.openai.com".to_string(),
        }
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            failure_reset_secs: 3,
            session_idle_secs: 3600,
            request_timeout_secs: 0,
            max_sessions: 1000,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl SpiritConfig {
    /// Load configuration from `path`, or from `spirit.toml` when present,
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> SpiritResult<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> SpiritResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| SpiritError::config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> SpiritResult<Self> {
        toml::from_str(content).map_err(|e| SpiritError::config(e.to_string()))
    }

    /// Override secrets from the environment using the given lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("ANTHROPIC_API_KEY") {
            self.anthropic.api_key = Some(key);
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.openai.api_key = Some(key);
        }
        if let Some(passcode) = lookup("SPIRIT_PASSCODE") {
            self.passcode = passcode;
        }
    }

    /// Build the HTTP client shared by both providers.
    pub fn http_client(&self) -> SpiritResult<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if self.quiz.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(self.quiz.request_timeout_secs));
        }
        builder
            .build()
            .map_err(|e| SpiritError::config(format!("failed to build HTTP client: {}", e)))
    }

    pub fn failure_reset_delay(&self) -> Duration {
        Duration::from_secs(self.quiz.failure_reset_secs)
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.quiz.session_idle_secs)
    }
}
