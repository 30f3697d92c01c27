use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::catalog::{DEFAULT_DESCRIPTION_LEVEL, PLANT_DESCRIPTIONS_KEY};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub remote_config: RemoteConfigSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Settings for the remote configuration fetcher.
///
/// When `url` is absent every fetch fails with
/// [`FetchError::NotConfigured`](crate::remote_config::FetchError::NotConfigured)
/// and descriptions are applied from the defaults.
#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfigSettings {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_cache_expiration_secs")]
    pub cache_expiration_secs: u64,
    /// Forces the cache expiration to zero so every fetch goes to the source.
    #[serde(default)]
    pub developer_mode: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_defaults")]
    pub defaults: BTreeMap<String, String>,
}

impl Default for RemoteConfigSettings {
    fn default() -> Self {
        Self {
            url: None,
            cache_expiration_secs: default_cache_expiration_secs(),
            developer_mode: false,
            timeout_secs: default_timeout_secs(),
            defaults: default_defaults(),
        }
    }
}

fn default_cache_expiration_secs() -> u64 {
    3600
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_defaults() -> BTreeMap<String, String> {
    let mut defaults = BTreeMap::new();
    defaults.insert(
        PLANT_DESCRIPTIONS_KEY.to_string(),
        DEFAULT_DESCRIPTION_LEVEL.to_string(),
    );
    defaults
}

impl RemoteConfigSettings {
    /// Cache expiration actually used for a fetch, in seconds.
    pub fn effective_cache_expiration(&self) -> u64 {
        if self.developer_mode {
            0
        } else {
            self.cache_expiration_secs
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let remote = &config.remote_config;

    if remote.timeout_secs == 0 {
        anyhow::bail!("remote_config.timeout_secs must be > 0");
    }

    if let Some(url) = &remote.url {
        let parsed = reqwest::Url::parse(url)
            .with_context(|| format!("remote_config.url is not a valid URL: {}", url))?;
        match parsed.scheme() {
            "http" | "https" => {}
            "file" => {
                if parsed.to_file_path().is_err() {
                    anyhow::bail!(
                        "remote_config.url must name a local file: {}",
                        url
                    );
                }
            }
            other => anyhow::bail!(
                "Unsupported remote_config.url scheme: '{}'. Must be http, https, or file.",
                other
            ),
        }
    }

    Ok(())
}
