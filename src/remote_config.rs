//! Remote configuration: sources, snapshots, fetch and activation.
//!
//! A [`RemoteConfig`] tracks three things:
//!
//! - the **active** [`ConfigSnapshot`], which is what readers see;
//! - the **pending** fetch result, fetched but not yet activated;
//! - the **last fetch**, used to honour the cache expiration.
//!
//! ```text
//!   fetch(expiration) ──▶ pending ──activate_fetched()──▶ active
//!         │                                                 ▲
//!         └── within expiration: served from last fetch     │
//!                                                get_string()
//! ```
//!
//! Lookups fall back to the configured defaults when the active snapshot
//! has no value for a key. Activation replaces the active snapshot
//! wholesale; values are never merged.
//!
//! # Sources
//!
//! | `remote_config.url` | Source |
//! |---------------------|--------|
//! | unset | [`UnconfiguredSource`], always fails |
//! | `http://`, `https://` | [`HttpConfigSource`] |
//! | `file://` | [`FileConfigSource`] |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RemoteConfigSettings;

pub type ConfigValues = BTreeMap<String, String>;

/// Errors a fetch can end with. None of them escape the refresh flow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("remote config source is not configured")]
    NotConfigured,
    #[error("network error: {0}")]
    Network(String),
    #[error("remote config fetch throttled")]
    Throttled,
    #[error("remote config server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("invalid remote config payload: {0}")]
    Decode(String),
}

/// An immutable key/value view of configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSnapshot {
    values: ConfigValues,
}

impl ConfigSnapshot {
    pub fn new(values: ConfigValues) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Values returned by a source, stamped with the time they were fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedConfig {
    pub values: ConfigValues,
    pub fetched_at: i64,
    #[serde(default)]
    pub from_cache: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchStatus {
    #[default]
    NoFetchYet,
    Success { at: i64 },
    Failure { at: i64, reason: String },
    Throttled { at: i64 },
}

/// Everything about a [`RemoteConfig`] that outlives one process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfigState {
    #[serde(default)]
    pub active: Option<ConfigValues>,
    #[serde(default)]
    pub activated_at: Option<i64>,
    #[serde(default)]
    pub pending: Option<FetchedConfig>,
    #[serde(default)]
    pub last_fetch: Option<FetchedConfig>,
    #[serde(default)]
    pub last_status: FetchStatus,
}

/// A place remote configuration values come from.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Human-readable location, for logs and status output.
    fn describe(&self) -> String;

    async fn fetch_values(&self) -> Result<ConfigValues, FetchError>;
}

/// Used when no URL is configured.
pub struct UnconfiguredSource;

#[async_trait]
impl ConfigSource for UnconfiguredSource {
    fn describe(&self) -> String {
        "(none)".to_string()
    }

    async fn fetch_values(&self) -> Result<ConfigValues, FetchError> {
        Err(FetchError::NotConfigured)
    }
}

/// Fetches a JSON payload with `GET`.
pub struct HttpConfigSource {
    url: reqwest::Url,
    client: reqwest::Client,
}

impl HttpConfigSource {
    pub fn new(url: reqwest::Url, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { url, client })
    }
}

#[async_trait]
impl ConfigSource for HttpConfigSource {
    fn describe(&self) -> String {
        self.url.to_string()
    }

    async fn fetch_values(&self) -> Result<ConfigValues, FetchError> {
        let response = self
            .client
            .get(self.url.clone())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(FetchError::Throttled);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        parse_payload(&body)
    }
}

/// Reads a JSON payload from the local filesystem.
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl ConfigSource for FileConfigSource {
    fn describe(&self) -> String {
        format!("file://{}", self.path.display())
    }

    async fn fetch_values(&self) -> Result<ConfigValues, FetchError> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FetchError::Network(format!("{}: {}", self.path.display(), e)))?;
        parse_payload(&body)
    }
}

/// Build the source named by `remote_config.url`.
pub fn create_source(settings: &RemoteConfigSettings) -> anyhow::Result<Box<dyn ConfigSource>> {
    let Some(raw) = settings.url.as_deref() else {
        return Ok(Box::new(UnconfiguredSource));
    };

    let url = reqwest::Url::parse(raw)?;
    match url.scheme() {
        "http" | "https" => Ok(Box::new(HttpConfigSource::new(
            url,
            Duration::from_secs(settings.timeout_secs),
        )?)),
        "file" => {
            let path = url
                .to_file_path()
                .map_err(|_| anyhow::anyhow!("Invalid file URL: {}", raw))?;
            Ok(Box::new(FileConfigSource::new(path)))
        }
        other => anyhow::bail!("Unsupported remote config scheme: {}", other),
    }
}

/// Decode a remote config payload.
///
/// Accepts the template shape `{"entries": {...}, "state": "..."}` or a flat
/// object. A template with a `state` but no `entries` (an empty template)
/// decodes to no values. Non-string values keep their JSON text.
pub fn parse_payload(body: &str) -> Result<ConfigValues, FetchError> {
    let json: serde_json::Value =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    let object = json
        .as_object()
        .ok_or_else(|| FetchError::Decode("expected a JSON object".to_string()))?;

    let entries = match object.get("entries") {
        Some(entries) => entries
            .as_object()
            .ok_or_else(|| FetchError::Decode("`entries` must be an object".to_string()))?,
        None if object.contains_key("state") => return Ok(ConfigValues::new()),
        None => object,
    };

    Ok(entries
        .iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect())
}

/// Remote configuration with an explicit activation step.
pub struct RemoteConfig {
    source: Box<dyn ConfigSource>,
    defaults: ConfigSnapshot,
    active: Arc<ConfigSnapshot>,
    state: RemoteConfigState,
}

impl RemoteConfig {
    pub fn new(source: Box<dyn ConfigSource>, defaults: ConfigValues) -> Self {
        Self {
            source,
            defaults: ConfigSnapshot::new(defaults),
            active: Arc::new(ConfigSnapshot::default()),
            state: RemoteConfigState::default(),
        }
    }

    /// Restore state persisted by an earlier process.
    pub fn with_state(mut self, state: RemoteConfigState) -> Self {
        self.active = Arc::new(ConfigSnapshot::new(
            state.active.clone().unwrap_or_default(),
        ));
        self.state = state;
        self
    }

    pub fn state(&self) -> &RemoteConfigState {
        &self.state
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    /// The active snapshot. Holders keep their copy across activations.
    pub fn active(&self) -> Arc<ConfigSnapshot> {
        Arc::clone(&self.active)
    }

    pub fn defaults(&self) -> &ConfigSnapshot {
        &self.defaults
    }

    /// Active value for `key`, else its default, else the empty string.
    pub fn get_string(&self, key: &str) -> String {
        self.active
            .get(key)
            .or_else(|| self.defaults.get(key))
            .unwrap_or_default()
            .to_string()
    }

    /// Fetch values from the source unless the last fetch is younger than
    /// `cache_expiration`.
    ///
    /// On success the values become pending; call
    /// [`activate_fetched`](Self::activate_fetched) to make them visible.
    /// On failure nothing pending or active changes.
    pub async fn fetch(&mut self, cache_expiration: Duration) -> Result<FetchedConfig, FetchError> {
        let now = chrono::Utc::now().timestamp();

        if let Some(last) = &self.state.last_fetch {
            let age = now.saturating_sub(last.fetched_at);
            if age >= 0 && (age as u64) < cache_expiration.as_secs() {
                tracing::debug!(age_secs = age, "serving remote config from cache");
                return Ok(FetchedConfig {
                    from_cache: true,
                    ..last.clone()
                });
            }
        }

        match self.source.fetch_values().await {
            Ok(values) => {
                let fetched = FetchedConfig {
                    values,
                    fetched_at: now,
                    from_cache: false,
                };
                self.state.last_fetch = Some(fetched.clone());
                self.state.pending = Some(fetched.clone());
                self.state.last_status = FetchStatus::Success { at: now };
                Ok(fetched)
            }
            Err(err) => {
                self.state.last_status = match &err {
                    FetchError::Throttled => FetchStatus::Throttled { at: now },
                    other => FetchStatus::Failure {
                        at: now,
                        reason: other.to_string(),
                    },
                };
                Err(err)
            }
        }
    }

    /// Promote the pending fetch to the active snapshot.
    ///
    /// Returns `false` when nothing was pending.
    pub fn activate_fetched(&mut self) -> bool {
        let Some(pending) = self.state.pending.take() else {
            return false;
        };

        let now = chrono::Utc::now().timestamp();
        self.active = Arc::new(ConfigSnapshot::new(pending.values.clone()));
        self.state.active = Some(pending.values);
        self.state.activated_at = Some(now);
        tracing::info!(keys = self.active.len(), "activated remote config");
        true
    }
}
