//! The plant record store.
//!
//! [`PlantStore`] is the seam between the description refresh flow and
//! persistence. The flow only ever issues update-by-predicate calls against
//! it; listing and lookups serve the CLI views.
//!
//! [`SqlitePlantStore`] is the production implementation over the `plants`
//! table created by [`crate::migrate`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use crate::config::Config;
use crate::db;
use crate::models::Plant;

/// A row filter: a fixed SQL predicate plus its positional arguments.
///
/// Arguments are strings, bound in order to the `?` placeholders of
/// `clause`. The clause itself is always a compile-time constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub clause: &'static str,
    pub args: Vec<String>,
}

impl Selection {
    /// Exact match on the plant id.
    pub fn by_id(id: i64) -> Self {
        Self {
            clause: "id = ?",
            args: vec![id.to_string()],
        }
    }
}

#[async_trait]
pub trait PlantStore: Send + Sync {
    /// Set `description` on every row matching `selection`.
    ///
    /// Returns the number of rows changed; zero means nothing matched.
    async fn update_description(&self, description: &str, selection: &Selection) -> Result<u64>;

    /// All plants ordered by id, projecting `id, name, description, price`.
    async fn list_plants(&self) -> Result<Vec<Plant>>;

    async fn get_plant(&self, id: i64) -> Result<Option<Plant>>;
}

pub struct SqlitePlantStore {
    pool: SqlitePool,
}

impl SqlitePlantStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &Config) -> Result<Self> {
        Ok(Self::new(db::connect(config).await?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn plant_from_row(row: &sqlx::sqlite::SqliteRow) -> Plant {
    Plant {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        price_cents: row.get("price"),
    }
}

#[async_trait]
impl PlantStore for SqlitePlantStore {
    async fn update_description(&self, description: &str, selection: &Selection) -> Result<u64> {
        let sql = format!("UPDATE plants SET description = ? WHERE {}", selection.clause);

        let mut query = sqlx::query(&sql).bind(description);
        for arg in &selection.args {
            query = query.bind(arg.as_str());
        }

        let result = query
            .execute(&self.pool)
            .await
            .with_context(|| format!("update failed for {:?}", selection.args))?;

        Ok(result.rows_affected())
    }

    async fn list_plants(&self) -> Result<Vec<Plant>> {
        let rows = sqlx::query("SELECT id, name, description, price FROM plants ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(plant_from_row).collect())
    }

    async fn get_plant(&self, id: i64) -> Result<Option<Plant>> {
        let row = sqlx::query("SELECT id, name, description, price FROM plants WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(plant_from_row))
    }
}
