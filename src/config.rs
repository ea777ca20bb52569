use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub load: LoadConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoadConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

fn default_batch_size() -> usize {
    500
}

/// Settings for the HTTP sink and the reference-data fetcher.
///
/// `window_size` bounds how many requests are in flight at once inside a
/// single batch commit; `window_delay_ms` is the fixed pause between
/// windows, honoring the destination's rate limit.
#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_window_delay_ms")]
    pub window_delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            window_size: default_window_size(),
            window_delay_ms: default_window_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_window_size() -> usize {
    8
}
fn default_window_delay_ms() -> u64 {
    250
}
fn default_timeout_secs() -> u64 {
    30
}

impl RemoteConfig {
    pub fn endpoint(&self) -> Result<&str> {
        self.endpoint
            .as_deref()
            .context("remote.endpoint must be set for http destinations")
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.load.batch_size == 0 {
        anyhow::bail!("load.batch_size must be > 0");
    }

    if config.remote.window_size == 0 {
        anyhow::bail!("remote.window_size must be > 0");
    }

    Ok(config)
}
