//! Configuration management for LLM Council

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CouncilError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Chat-completion provider shared by every council member
    pub provider: ProviderConfig,

    /// Council membership and pacing
    pub council: CouncilConfig,

    /// HTTP service settings
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Chat-completion endpoint URL
    pub endpoint: String,

    /// API key (can be env var reference like $OPEN_ROUTER_KEY)
    pub api_key: String,

    /// Value sent as `HTTP-Referer`
    pub referer: String,

    /// Value sent as `X-Title`
    pub title: String,

    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilConfig {
    /// Models asked in the dispatch phase, in answer order
    pub members: Vec<String>,

    /// Model that synthesizes the verdict
    pub judge: String,

    /// Provider calls allowed in flight at once
    pub max_concurrent_requests: usize,

    /// Pause before the single retry after a 429
    pub rate_limit_backoff_ms: u64,

    /// Pause between the dispatch phase and the judge call
    pub judge_cooldown_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address for the HTTP service
    pub bind: String,

    /// CORS origins; empty allows any origin
    pub allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig {
                endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
                api_key: "$OPEN_ROUTER_KEY".to_string(),
                referer: "http://localhost:5173".to_string(),
                title: "LLM Council".to_string(),
                timeout_secs: 45,
            },
            council: CouncilConfig {
                members: vec![
                    "x-ai/grok-4.1-fast:free".to_string(),
                    "google/gemini-2.0-flash-exp:free".to_string(),
                    "meta-llama/llama-3.3-70b-instruct:free".to_string(),
                    "deepseek/deepseek-r1:free".to_string(),
                    "mistralai/mistral-7b-instruct:free".to_string(),
                    "mistralai/mistral-nemo:free".to_string(),
                ],
                judge: "x-ai/grok-4.1-fast:free".to_string(),
                max_concurrent_requests: 1,
                rate_limit_backoff_ms: 2_000,
                judge_cooldown_ms: 3_000,
            },
            server: ServerConfig {
                bind: "127.0.0.1:8000".to_string(),
                allowed_origins: Vec::new(),
            },
        }
    }
}

impl Config {
    /// Load config from file or create default
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_path(),
        };

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Config>(&content)?
        } else {
            let config = Config::default();
            config.save(&config_path)?;
            config
        };

        config.validate()?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("llm-council")
            .join("config.toml")
    }

    /// Reject settings the council cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.council.members.is_empty() {
            return Err(CouncilError::Config("council has no members".to_string()));
        }
        if self.council.members.iter().any(|m| m.trim().is_empty()) {
            return Err(CouncilError::Config("blank council member id".to_string()));
        }
        if self.council.judge.trim().is_empty() {
            return Err(CouncilError::Config("no judge model configured".to_string()));
        }
        if self.council.max_concurrent_requests == 0 {
            return Err(CouncilError::InvalidConcurrency);
        }
        Ok(())
    }

    /// Resolve API key from config (handles env var references)
    pub fn resolve_api_key(&self) -> Option<String> {
        let key = &self.provider.api_key;
        if let Some(var) = key.strip_prefix('$') {
            std::env::var(var).ok().filter(|v| !v.is_empty())
        } else if key.is_empty() {
            None
        } else {
            Some(key.clone())
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CouncilConfig {
    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_millis(self.rate_limit_backoff_ms)
    }

    pub fn judge_cooldown(&self) -> Duration {
        Duration::from_millis(self.judge_cooldown_ms)
    }
}
