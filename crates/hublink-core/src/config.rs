use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::pool::{PoolSettings, DEFAULT_POOL_SIZE};
use crate::retry::RetryPolicy;

/// Retry strategy selector in config.toml.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryKind {
    None,
    Fixed,
    Incremental,
    #[default]
    Exponential,
}

/// Retry policy parameters (`[retry]` in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub kind: RetryKind,
    /// Retries allowed after the first failure.
    pub max_retries: u32,
    /// Fixed delay, or the per-retry step for `incremental`.
    pub delay_ms: u64,
    /// Upper bound for `incremental` and `exponential`.
    pub max_delay_ms: u64,
    pub use_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            kind: RetryKind::Exponential,
            max_retries: 10,
            delay_ms: 1_000,
            max_delay_ms: 10_000,
            use_jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> Result<RetryPolicy, ConfigError> {
        let delay = Duration::from_millis(self.delay_ms);
        let max_delay = Duration::from_millis(self.max_delay_ms);
        match self.kind {
            RetryKind::None => Ok(RetryPolicy::NoRetry),
            RetryKind::Fixed => RetryPolicy::fixed_delay(self.max_retries, delay, self.use_jitter),
            RetryKind::Incremental => {
                RetryPolicy::incremental_delay(self.max_retries, delay, max_delay, self.use_jitter)
            }
            RetryKind::Exponential => {
                RetryPolicy::exponential_backoff(self.max_retries, max_delay, self.use_jitter)
            }
        }
    }
}

/// Connection pooling parameters (`[pool]` in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub pooling: bool,
    pub max_pool_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pooling: false,
            max_pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl PoolConfig {
    pub fn to_settings(&self) -> Result<PoolSettings, ConfigError> {
        PoolSettings::new(self.pooling, self.max_pool_size)
    }
}

/// Global configuration loaded from `~/.config/hublink/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HublinkConfig {
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub pool: PoolConfig,
}

impl HublinkConfig {
    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigError> {
        self.retry.to_policy()
    }

    pub fn pool_settings(&self) -> Result<PoolSettings, ConfigError> {
        self.pool.to_settings()
    }

    /// Reject values that would fail later when building runtime types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.retry_policy()?;
        self.pool_settings()?;
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hublink")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load and validate configuration from `path`.
pub fn load_from_path(path: &Path) -> Result<HublinkConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: HublinkConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HublinkConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = HublinkConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}
