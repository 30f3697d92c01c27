//! User preferences: the first-load flag and the gardening experience rating.
//!
//! Stored as key/value rows in the `preferences` table.

use anyhow::{bail, Result};
use sqlx::sqlite::SqlitePool;

use crate::config::Config;
use crate::db;

pub const EXPERIENCE_LABELS: [&str; 5] = [
    "Beginner",
    "Some experience",
    "Experienced",
    "Very experienced",
    "Expert",
];

const KEY_FIRST_LOAD: &str = "first_load";
const KEY_GARDENING_EXPERIENCE: &str = "gardening_experience";

async fn get(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value = sqlx::query_scalar("SELECT value FROM preferences WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(value)
}

async fn set(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO preferences (key, value) VALUES (?, ?) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

/// `true` until [`set_first_load`] clears it.
pub async fn get_first_load(pool: &SqlitePool) -> Result<bool> {
    Ok(get(pool, KEY_FIRST_LOAD).await?.as_deref() != Some("false"))
}

pub async fn set_first_load(pool: &SqlitePool, first_load: bool) -> Result<()> {
    set(pool, KEY_FIRST_LOAD, if first_load { "true" } else { "false" }).await
}

/// The saved rating index into [`EXPERIENCE_LABELS`], if any.
pub async fn get_gardening_experience(pool: &SqlitePool) -> Result<Option<usize>> {
    let stored = get(pool, KEY_GARDENING_EXPERIENCE).await?;
    Ok(stored
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&i| i < EXPERIENCE_LABELS.len()))
}

pub async fn set_gardening_experience(pool: &SqlitePool, choice: usize) -> Result<()> {
    if choice >= EXPERIENCE_LABELS.len() {
        bail!(
            "experience rating must be between 0 and {}",
            EXPERIENCE_LABELS.len() - 1
        );
    }
    set(pool, KEY_GARDENING_EXPERIENCE, &choice.to_string()).await
}

/// CLI entry point for `greenthumb rate`.
///
/// Without a choice, lists the labels and marks the saved one. A negative
/// choice means "nothing selected" and leaves the saved rating untouched.
pub async fn run_rate(config: &Config, choice: Option<i64>) -> Result<()> {
    let pool = db::connect(config).await?;

    match choice {
        None => {
            let current = get_gardening_experience(&pool).await?;
            println!("Rate your gardening experience:");
            for (i, label) in EXPERIENCE_LABELS.iter().enumerate() {
                let marker = if current == Some(i) { "*" } else { " " };
                println!("  {} {}  {}", marker, i, label);
            }
        }
        Some(c) if c < 0 => {
            println!("No rating selected; nothing saved.");
        }
        Some(c) => {
            let index = usize::try_from(c)?;
            set_gardening_experience(&pool, index).await?;
            tracing::info!(rating = index, "saved gardening experience");
            println!("Saved gardening experience: {}", EXPERIENCE_LABELS[index]);
        }
    }

    pool.close().await;
    Ok(())
}
