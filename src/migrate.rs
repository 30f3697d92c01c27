use anyhow::Result;
use sqlx::sqlite::SqlitePool;

use crate::catalog::{Catalog, DescriptionLevel};
use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let catalog = Catalog::bundled()?;

    create_schema(&pool).await?;
    let seeded = seed_plants(&pool, &catalog).await?;
    if seeded > 0 {
        tracing::info!(plants = seeded, "seeded plant catalog");
    }

    pool.close().await;
    Ok(())
}

/// Create all tables. Safe to run repeatedly.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS plants (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            price INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS preferences (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Single-row table holding the serialized remote config state
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS config_cache (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            state_json TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_plants_name ON plants(name)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Insert the catalog's plants with their basic descriptions, only into an
/// empty table. Returns the number of rows inserted.
pub async fn seed_plants(pool: &SqlitePool, catalog: &Catalog) -> Result<usize> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM plants")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(0);
    }

    let descriptions = catalog.dataset(DescriptionLevel::Basic);
    let mut tx = pool.begin().await?;
    for ((id, description), seed) in descriptions.targets().zip(catalog.plants()) {
        sqlx::query("INSERT INTO plants (id, name, description, price) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(&seed.name)
            .bind(description)
            .bind(seed.price_cents)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    Ok(catalog.plants().len())
}
