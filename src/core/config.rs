use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_EXCHANGERATE_URL: &str = "https://v6.exchangerate-api.com/v6";

fn default_base_url() -> String {
    DEFAULT_EXCHANGERATE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_refresh_interval_secs() -> u64 {
    60
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeRateProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra attempts after a failed request; at most one is honoured.
    #[serde(default)]
    pub retries: usize,
}

impl ExchangeRateProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    pub exchangerate: Option<ExchangeRateProviderConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Rates are cached for this long when set.
    pub cache_ttl_secs: Option<u64>,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            providers: ProvidersConfig::default(),
            currency: default_currency(),
            cache_ttl_secs: None,
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "risklens", "risklens")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn exchangerate(&self) -> Result<&ExchangeRateProviderConfig> {
        self.providers
            .exchangerate
            .as_ref()
            .context("No exchange rate provider configured; run `risklens setup` and set an API key")
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}
