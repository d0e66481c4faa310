//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{CollectOptions, CostTable};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API access settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Retry and backoff for transient failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Quota budget and per-operation costs
    #[serde(default)]
    pub quota: QuotaConfig,

    /// Snapshot storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Default options for `collect`
    #[serde(default)]
    pub collect: CollectOptions,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::validation("api.base_url is empty"));
        }
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::validation("api.user_agent is empty"));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::validation("api.timeout_secs must be > 0"));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::validation("retry.max_attempts must be > 0"));
        }
        if self.retry.max_backoff_ms < self.retry.initial_backoff_ms {
            return Err(AppError::validation(
                "retry.max_backoff_ms must be >= retry.initial_backoff_ms",
            ));
        }
        if self.quota.daily_budget == 0 {
            return Err(AppError::validation("quota.daily_budget must be > 0"));
        }
        if self.collect.max_comments_per_video != 0
            && self.collect.max_top_level_comments > self.collect.max_comments_per_video
        {
            log::warn!(
                "collect.max_top_level_comments ({}) exceeds max_comments_per_video ({}); the latter wins",
                self.collect.max_top_level_comments,
                self.collect.max_comments_per_video
            );
        }
        Ok(())
    }

    /// The API key from the config file, or from the configured environment
    /// variable.
    pub fn api_key(&self) -> Option<String> {
        self.api
            .key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&self.api.key_env).ok())
    }
}

/// Remote API access settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the Data API
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// API key (prefer `key_env` to keep secrets out of files)
    #[serde(default)]
    pub key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default = "defaults::key_env")]
    pub key_env: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            key: None,
            key_env: defaults::key_env(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Retry settings for transient failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per request, including the first one
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "defaults::initial_backoff")]
    pub initial_backoff_ms: u64,

    #[serde(default = "defaults::max_backoff")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            initial_backoff_ms: defaults::initial_backoff(),
            max_backoff_ms: defaults::max_backoff(),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based), doubling each time.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    /// No retries and no sleeping.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }
}

/// Quota budget settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Units available to one ledger
    #[serde(default = "defaults::daily_budget")]
    pub daily_budget: u64,

    #[serde(default)]
    pub costs: CostTable,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            daily_budget: defaults::daily_budget(),
            costs: CostTable::default(),
        }
    }
}

/// Snapshot storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory of the JSON repository
    #[serde(default = "defaults::storage_root")]
    pub root: PathBuf,

    /// Number of superseded snapshots kept per channel
    #[serde(default = "defaults::keep_history")]
    pub keep_history: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: defaults::storage_root(),
            keep_history: defaults::keep_history(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Api defaults
    pub fn base_url() -> String {
        "https://www.googleapis.com/youtube/v3".into()
    }
    pub fn key_env() -> String {
        "YOUTUBE_API_KEY".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; channel-collector/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Retry defaults
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn initial_backoff() -> u64 {
        500
    }
    pub fn max_backoff() -> u64 {
        8_000
    }

    // Quota defaults
    pub fn daily_budget() -> u64 {
        10_000
    }

    // Storage defaults
    pub fn storage_root() -> PathBuf {
        PathBuf::from("storage")
    }
    pub fn keep_history() -> usize {
        5
    }
}
