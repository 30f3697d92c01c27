//! Library-level tests of the fetch → activate → apply flow against a real
//! SQLite plant store.
//!
//! A scripted [`ConfigSource`] stands in for the network so success,
//! failure and caching paths can be driven deterministically.

use async_trait::async_trait;
use greenthumb::apply::UpdateOutcome;
use greenthumb::catalog::{Catalog, DescriptionLevel};
use greenthumb::config::{Config, DbConfig, RemoteConfigSettings};
use greenthumb::config_cache;
use greenthumb::migrate;
use greenthumb::refresh::{fetch_and_apply, FetchOutcome};
use greenthumb::remote_config::{
    create_source, ConfigSource, ConfigValues, FetchError, HttpConfigSource, RemoteConfig,
};
use greenthumb::store::{PlantStore, SqlitePlantStore};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

// ─── Scripted source ────────────────────────────────────────────────

struct ScriptedSource {
    results: Mutex<Vec<Result<ConfigValues, FetchError>>>,
    calls: Arc<AtomicUsize>,
}

fn scripted(
    results: Vec<Result<ConfigValues, FetchError>>,
) -> (Box<dyn ConfigSource>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut results = results;
    results.reverse();
    let source = ScriptedSource {
        results: Mutex::new(results),
        calls: Arc::clone(&calls),
    };
    (Box::new(source), calls)
}

#[async_trait]
impl ConfigSource for ScriptedSource {
    fn describe(&self) -> String {
        "scripted".to_string()
    }

    async fn fetch_values(&self) -> Result<ConfigValues, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.results
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Err(FetchError::Network("script exhausted".to_string())))
    }
}

// ─── Local HTTP server ──────────────────────────────────────────────

/// Serves exactly one canned response on a free local port and returns
/// the URL to fetch.
fn serve_once(status: &str, body: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );

    std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
    });

    format!("http://127.0.0.1:{}/remote-config.json", port)
}

fn http_source(url: &str) -> HttpConfigSource {
    HttpConfigSource::new(url.parse().unwrap(), Duration::from_secs(5)).unwrap()
}

// ─── Helpers ────────────────────────────────────────────────────────

fn level(value: &str) -> ConfigValues {
    let mut values = ConfigValues::new();
    values.insert("plant_description".to_string(), value.to_string());
    values
}

fn defaults() -> ConfigValues {
    RemoteConfigSettings::default().defaults
}

async fn setup_store() -> (TempDir, Config, SqlitePlantStore) {
    let tmp = TempDir::new().unwrap();
    let config = Config {
        db: DbConfig {
            path: tmp.path().join("data").join("greenthumb.sqlite"),
        },
        remote_config: RemoteConfigSettings::default(),
    };
    migrate::run_migrations(&config).await.unwrap();
    let store = SqlitePlantStore::connect(&config).await.unwrap();
    (tmp, config, store)
}

async fn descriptions(store: &SqlitePlantStore) -> Vec<String> {
    store
        .list_plants()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.description)
        .collect()
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_seeded_store_has_basic_descriptions() {
    let (_tmp, _config, store) = setup_store().await;
    let catalog = Catalog::bundled().unwrap();

    let expected: Vec<String> = catalog.dataset(DescriptionLevel::Basic).entries.to_vec();
    assert_eq!(descriptions(&store).await, expected);

    let first = store.get_plant(1).await.unwrap().unwrap();
    assert_eq!(first.name, catalog.plants()[0].name);
    assert_eq!(first.price_cents, catalog.plants()[0].price_cents);
}

#[tokio::test]
async fn test_successful_fetch_applies_advanced() {
    let (_tmp, _config, store) = setup_store().await;
    let catalog = Catalog::bundled().unwrap();
    let (source, _) = scripted(vec![Ok(level("advanced"))]);
    let mut remote = RemoteConfig::new(source, defaults());

    let summary = fetch_and_apply(&mut remote, Duration::ZERO, &catalog, &store).await;

    assert_eq!(
        summary.fetch,
        FetchOutcome::Fetched {
            from_cache: false,
            keys: 1
        }
    );
    assert!(summary.activated);
    assert_eq!(summary.report.level, DescriptionLevel::Advanced);

    let advanced = catalog.dataset(DescriptionLevel::Advanced);
    assert_eq!(summary.report.results.len(), advanced.len());
    assert_eq!(descriptions(&store).await, advanced.entries.to_vec());
}

#[tokio::test]
async fn test_failed_fetch_without_history_applies_defaults() {
    let (_tmp, _config, store) = setup_store().await;
    let catalog = Catalog::bundled().unwrap();
    let (source, calls) = scripted(vec![Err(FetchError::Network("offline".to_string()))]);
    let mut remote = RemoteConfig::new(source, defaults());

    let summary = fetch_and_apply(&mut remote, Duration::ZERO, &catalog, &store).await;

    assert!(matches!(summary.fetch, FetchOutcome::Failed(FetchError::Network(_))));
    assert!(!summary.activated);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(summary.report.level, DescriptionLevel::Basic);
    assert_eq!(summary.report.value, "basic");
    assert_eq!(
        summary.report.updated(),
        catalog.dataset(DescriptionLevel::Basic).len()
    );
}

#[tokio::test]
async fn test_failed_fetch_keeps_previously_activated_level() {
    let (_tmp, _config, store) = setup_store().await;
    let catalog = Catalog::bundled().unwrap();
    let (source, _) = scripted(vec![Ok(level("advanced")), Err(FetchError::Throttled)]);
    let mut remote = RemoteConfig::new(source, defaults());

    fetch_and_apply(&mut remote, Duration::ZERO, &catalog, &store).await;
    let summary = fetch_and_apply(&mut remote, Duration::ZERO, &catalog, &store).await;

    assert_eq!(summary.fetch, FetchOutcome::Failed(FetchError::Throttled));
    assert_eq!(summary.report.level, DescriptionLevel::Advanced);
    assert_eq!(
        descriptions(&store).await,
        catalog.dataset(DescriptionLevel::Advanced).entries.to_vec()
    );
}

#[tokio::test]
async fn test_missing_key_uses_default_level() {
    let (_tmp, _config, store) = setup_store().await;
    let catalog = Catalog::bundled().unwrap();
    let mut values = ConfigValues::new();
    values.insert("banner".to_string(), "spring-sale".to_string());
    let (source, _) = scripted(vec![Ok(values)]);
    let mut remote = RemoteConfig::new(source, defaults());

    let summary = fetch_and_apply(&mut remote, Duration::ZERO, &catalog, &store).await;

    assert!(summary.activated);
    assert_eq!(summary.report.level, DescriptionLevel::Basic);
}

#[tokio::test]
async fn test_cached_fetch_does_not_hit_source() {
    let (_tmp, _config, store) = setup_store().await;
    let catalog = Catalog::bundled().unwrap();
    let (source, calls) = scripted(vec![Ok(level("advanced")), Ok(level("basic"))]);
    let mut remote = RemoteConfig::new(source, defaults());
    let hour = Duration::from_secs(3600);

    fetch_and_apply(&mut remote, hour, &catalog, &store).await;
    let summary = fetch_and_apply(&mut remote, hour, &catalog, &store).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        summary.fetch,
        FetchOutcome::Fetched {
            from_cache: true,
            keys: 1
        }
    );
    assert!(!summary.activated);
    assert_eq!(summary.report.level, DescriptionLevel::Advanced);
}

#[tokio::test]
async fn test_developer_mode_always_fetches_live() {
    let (_tmp, _config, store) = setup_store().await;
    let catalog = Catalog::bundled().unwrap();
    let settings = RemoteConfigSettings {
        developer_mode: true,
        ..Default::default()
    };
    let (source, calls) = scripted(vec![Ok(level("advanced")), Ok(level("basic"))]);
    let mut remote = RemoteConfig::new(source, settings.defaults.clone());
    let expiration = Duration::from_secs(settings.effective_cache_expiration());

    fetch_and_apply(&mut remote, expiration, &catalog, &store).await;
    let summary = fetch_and_apply(&mut remote, expiration, &catalog, &store).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(summary.report.level, DescriptionLevel::Basic);
}

#[tokio::test]
async fn test_deleted_row_is_reported_missing() {
    let (_tmp, _config, store) = setup_store().await;
    let catalog = Catalog::bundled().unwrap();
    sqlx::query("DELETE FROM plants WHERE id = 2")
        .execute(store.pool())
        .await
        .unwrap();

    let (source, _) = scripted(vec![Ok(level("advanced"))]);
    let mut remote = RemoteConfig::new(source, defaults());
    let summary = fetch_and_apply(&mut remote, Duration::ZERO, &catalog, &store).await;

    let report = &summary.report;
    assert_eq!(report.missing(), 1);
    assert_eq!(report.results[1].id, 2);
    assert_eq!(report.results[1].outcome, UpdateOutcome::Missing);
    assert_eq!(report.updated(), report.results.len() - 1);
    assert!(store.get_plant(2).await.unwrap().is_none());
}

#[tokio::test]
async fn test_state_survives_persistence() {
    let (_tmp, _config, store) = setup_store().await;
    let catalog = Catalog::bundled().unwrap();
    let (source, _) = scripted(vec![Ok(level("advanced"))]);
    let mut remote = RemoteConfig::new(source, defaults());

    fetch_and_apply(&mut remote, Duration::ZERO, &catalog, &store).await;
    config_cache::save_state(store.pool(), remote.state())
        .await
        .unwrap();

    // A later process that cannot reach the source still sees "advanced".
    let restored_state = config_cache::load_state(store.pool()).await.unwrap();
    assert_eq!(&restored_state, remote.state());

    let (offline, _) = scripted(vec![Err(FetchError::NotConfigured)]);
    let mut restored = RemoteConfig::new(offline, defaults()).with_state(restored_state);
    let summary = fetch_and_apply(&mut restored, Duration::ZERO, &catalog, &store).await;

    assert_eq!(summary.report.level, DescriptionLevel::Advanced);
}

// ─── HTTP source ────────────────────────────────────────────────────

#[tokio::test]
async fn test_http_429_is_throttled() {
    let url = serve_once("429 Too Many Requests", "");
    let result = http_source(&url).fetch_values().await;
    assert_eq!(result, Err(FetchError::Throttled));
}

#[tokio::test]
async fn test_http_server_error_keeps_status_and_body() {
    let url = serve_once("503 Service Unavailable", "down");
    let result = http_source(&url).fetch_values().await;
    assert_eq!(
        result,
        Err(FetchError::Server {
            status: 503,
            body: "down".to_string()
        })
    );
}

#[tokio::test]
async fn test_http_entries_payload_is_decoded() {
    let url = serve_once(
        "200 OK",
        r#"{"entries":{"plant_description":"advanced"},"state":"UPDATE"}"#,
    );
    let values = http_source(&url).fetch_values().await.unwrap();
    assert_eq!(values, level("advanced"));
}

#[tokio::test]
async fn test_http_refused_connection_is_network_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let url = format!("http://127.0.0.1:{}/remote-config.json", port);
    let result = http_source(&url).fetch_values().await;
    assert!(matches!(result, Err(FetchError::Network(_))), "{:?}", result);
}

#[tokio::test]
async fn test_refresh_over_http_applies_advanced() {
    let (_tmp, _config, store) = setup_store().await;
    let catalog = Catalog::bundled().unwrap();
    let settings = RemoteConfigSettings {
        url: Some(serve_once(
            "200 OK",
            r#"{"entries":{"plant_description":"advanced"}}"#,
        )),
        ..Default::default()
    };
    let source = create_source(&settings).unwrap();
    let mut remote = RemoteConfig::new(source, settings.defaults.clone());

    let summary = fetch_and_apply(&mut remote, Duration::ZERO, &catalog, &store).await;

    assert_eq!(
        summary.fetch,
        FetchOutcome::Fetched {
            from_cache: false,
            keys: 1
        }
    );
    assert!(summary.activated);
    assert_eq!(summary.report.level, DescriptionLevel::Advanced);
    assert_eq!(
        descriptions(&store).await,
        catalog.dataset(DescriptionLevel::Advanced).entries.to_vec()
    );
}
