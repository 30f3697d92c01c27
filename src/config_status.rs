//! Remote config status overview.
//!
//! Shows what `greenthumb refresh` would apply right now: the active snapshot,
//! when it was activated, the defaults behind it and how the last fetch went.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::catalog::{DescriptionLevel, PLANT_DESCRIPTIONS_KEY};
use crate::config::Config;
use crate::config_cache;
use crate::db;
use crate::remote_config::{create_source, FetchStatus, RemoteConfig};

/// Run the `config` command: load the persisted state and print a summary.
pub async fn run_config_status(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let settings = &config.remote_config;

    let state = config_cache::load_state(&pool).await?;
    let remote =
        RemoteConfig::new(create_source(settings)?, settings.defaults.clone()).with_state(state);
    let state = remote.state();
    let now = Utc::now();

    println!("GreenThumb — Remote Config");
    println!("==========================");
    println!();
    println!("  Source:      {}", remote.source_description());
    println!(
        "  Expiration:  {}s{}",
        settings.effective_cache_expiration(),
        if settings.developer_mode {
            " (developer mode)"
        } else {
            ""
        }
    );
    println!(
        "  Last fetch:  {}",
        match &state.last_status {
            FetchStatus::NoFetchYet => "never".to_string(),
            FetchStatus::Success { at } => format!("ok, {}", describe_time(*at, now)),
            FetchStatus::Throttled { at } => format!("throttled, {}", describe_time(*at, now)),
            FetchStatus::Failure { at, reason } =>
                format!("failed, {} ({})", describe_time(*at, now), reason),
        }
    );
    println!(
        "  Activated:   {}",
        state
            .activated_at
            .map(|at| describe_time(at, now))
            .unwrap_or_else(|| "never (defaults only)".to_string())
    );
    if let Some(last) = &state.last_fetch {
        println!(
            "  Cache:       {}",
            describe_cache(last.fetched_at, settings.effective_cache_expiration(), now)
        );
    }
    if state.pending.is_some() {
        println!("  Pending:     fetched values not yet activated");
    }

    let active = remote.active();
    if !active.is_empty() {
        println!();
        println!("  Active values:");
        for (key, value) in active.iter() {
            println!("    {:<24} {}", key, value);
        }
    }

    if !remote.defaults().is_empty() {
        println!();
        println!("  Defaults:");
        for (key, value) in remote.defaults().iter() {
            println!("    {:<24} {}", key, value);
        }
    }

    let value = remote.get_string(PLANT_DESCRIPTIONS_KEY);
    println!();
    println!(
        "  Descriptions: {} ({} = {:?})",
        DescriptionLevel::from_config_value(&value),
        PLANT_DESCRIPTIONS_KEY,
        value
    );
    println!();

    pool.close().await;
    Ok(())
}

/// `2026-10-19 08:30 UTC (5m ago)`; future or unrepresentable stamps print
/// without the age.
fn describe_time(at: i64, now: DateTime<Utc>) -> String {
    let Some(then) = DateTime::from_timestamp(at, 0) else {
        return at.to_string();
    };
    let stamp = then.format("%Y-%m-%d %H:%M UTC");
    let secs = now.signed_duration_since(then).num_seconds();
    match secs {
        s if s < 0 => stamp.to_string(),
        0..=59 => format!("{} (just now)", stamp),
        s if s < 3600 => format!("{} ({}m ago)", stamp, s / 60),
        s if s < 86_400 => format!("{} ({}h ago)", stamp, s / 3600),
        s => format!("{} ({}d ago)", stamp, s / 86_400),
    }
}

/// Whether the next `refresh` would be served from the cached fetch.
fn describe_cache(fetched_at: i64, expiration_secs: u64, now: DateTime<Utc>) -> String {
    let age = now.timestamp().saturating_sub(fetched_at);
    let expiration = i64::try_from(expiration_secs).unwrap_or(i64::MAX);
    if age >= 0 && age < expiration {
        format!("fresh for {}s", expiration - age)
    } else {
        "expired, next refresh fetches live".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_describe_time() {
        let now = at("2026-10-19T12:00:00Z");
        let ts = |s: &str| at(s).timestamp();

        assert_eq!(
            describe_time(ts("2026-10-19T11:59:30Z"), now),
            "2026-10-19 11:59 UTC (just now)"
        );
        assert_eq!(
            describe_time(ts("2026-10-19T11:45:00Z"), now),
            "2026-10-19 11:45 UTC (15m ago)"
        );
        assert_eq!(
            describe_time(ts("2026-10-19T09:00:00Z"), now),
            "2026-10-19 09:00 UTC (3h ago)"
        );
        assert_eq!(
            describe_time(ts("2026-10-16T12:00:00Z"), now),
            "2026-10-16 12:00 UTC (3d ago)"
        );
        assert_eq!(
            describe_time(ts("2026-10-19T13:00:00Z"), now),
            "2026-10-19 13:00 UTC"
        );
    }

    #[test]
    fn test_describe_cache() {
        let now = at("2026-10-19T12:00:00Z");
        let fetched = now.timestamp() - 600;

        assert_eq!(describe_cache(fetched, 3600, now), "fresh for 3000s");
        assert_eq!(
            describe_cache(fetched, 600, now),
            "expired, next refresh fetches live"
        );
        assert_eq!(
            describe_cache(fetched, 0, now),
            "expired, next refresh fetches live"
        );
    }
}
