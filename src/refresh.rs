//! The description refresh flow.
//!
//! ```text
//! fetch(expiration) ──Ok──▶ activate_fetched() ──┐
//!        │                                        ├──▶ apply_descriptions()
//!        └────────Err (logged, swallowed) ────────┘
//! ```
//!
//! A failed fetch never fails the refresh. Descriptions are applied exactly
//! once either way, from whatever snapshot is active afterwards: the newly
//! activated one, an earlier one, or the defaults.

use anyhow::Result;
use std::time::Duration;

use crate::apply::{apply_descriptions, ApplyReport, UpdateOutcome};
use crate::catalog::Catalog;
use crate::config::Config;
use crate::config_cache;
use crate::remote_config::{create_source, FetchError, RemoteConfig};
use crate::store::{PlantStore, SqlitePlantStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched { from_cache: bool, keys: usize },
    Failed(FetchError),
}

#[derive(Debug, Clone)]
pub struct RefreshSummary {
    pub fetch: FetchOutcome,
    pub activated: bool,
    pub report: ApplyReport,
}

/// Fetch, activate on success, then apply descriptions.
pub async fn fetch_and_apply(
    remote: &mut RemoteConfig,
    cache_expiration: Duration,
    catalog: &Catalog,
    store: &dyn PlantStore,
) -> RefreshSummary {
    let (fetch, activated) = match remote.fetch(cache_expiration).await {
        Ok(fetched) => {
            let keys = fetched.values.len();
            let activated = remote.activate_fetched();
            (
                FetchOutcome::Fetched {
                    from_cache: fetched.from_cache,
                    keys,
                },
                activated,
            )
        }
        Err(err) => {
            tracing::warn!(
                source = %remote.source_description(),
                error = %err,
                "remote config fetch failed, applying current configuration"
            );
            (FetchOutcome::Failed(err), false)
        }
    };

    let report = apply_descriptions(remote, catalog, store).await;

    RefreshSummary {
        fetch,
        activated,
        report,
    }
}

/// CLI entry point for `greenthumb refresh`.
///
/// Loads the persisted remote config state, runs the flow, saves the state
/// back and prints a summary. `force` ignores the cache expiration.
pub async fn run_refresh(config: &Config, force: bool) -> Result<()> {
    let store = SqlitePlantStore::connect(config).await?;
    let catalog = Catalog::bundled()?;

    let settings = &config.remote_config;
    let state = config_cache::load_state(store.pool()).await?;
    let mut remote =
        RemoteConfig::new(create_source(settings)?, settings.defaults.clone()).with_state(state);

    let expiration = if force {
        Duration::ZERO
    } else {
        Duration::from_secs(settings.effective_cache_expiration())
    };

    let summary = fetch_and_apply(&mut remote, expiration, &catalog, &store).await;
    config_cache::save_state(store.pool(), remote.state()).await?;
    store.close().await;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RefreshSummary) {
    let report = &summary.report;

    match &summary.fetch {
        FetchOutcome::Fetched {
            from_cache: true,
            keys,
        } => println!("fetch:     cached ({} keys)", keys),
        FetchOutcome::Fetched { keys, .. } => println!("fetch:     ok ({} keys)", keys),
        FetchOutcome::Failed(err) => println!("fetch:     failed ({})", err),
    }
    println!(
        "activated: {}",
        if summary.activated { "yes" } else { "no" }
    );
    println!("level:     {} (value {:?})", report.level, report.value);
    println!(
        "updated:   {} / {}",
        report.updated(),
        report.results.len()
    );

    if report.missing() > 0 || report.failed() > 0 {
        println!("missing:   {}", report.missing());
        println!("failed:    {}", report.failed());
        for result in &report.results {
            match &result.outcome {
                UpdateOutcome::Updated => {}
                UpdateOutcome::Missing => println!("  plant {}: no such record", result.id),
                UpdateOutcome::Failed(reason) => println!("  plant {}: {}", result.id, reason),
            }
        }
    }
}
