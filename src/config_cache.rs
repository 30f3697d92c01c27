//! Persistence of [`RemoteConfigState`] in the `config_cache` table.
//!
//! Each CLI invocation is a fresh process, so the active snapshot, pending
//! values and last fetch time are stored between runs. A missing or
//! unreadable row restores as the empty state (defaults only).

use anyhow::Result;
use sqlx::sqlite::SqlitePool;

use crate::remote_config::RemoteConfigState;

pub async fn load_state(pool: &SqlitePool) -> Result<RemoteConfigState> {
    let row: Option<String> =
        sqlx::query_scalar("SELECT state_json FROM config_cache WHERE id = 1")
            .fetch_optional(pool)
            .await?;

    let Some(json) = row else {
        return Ok(RemoteConfigState::default());
    };

    match serde_json::from_str(&json) {
        Ok(state) => Ok(state),
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable remote config cache");
            Ok(RemoteConfigState::default())
        }
    }
}

pub async fn save_state(pool: &SqlitePool, state: &RemoteConfigState) -> Result<()> {
    let json = serde_json::to_string(state)?;
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        r#"
        INSERT INTO config_cache (id, state_json, updated_at)
        VALUES (1, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            state_json = excluded.state_json,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(json)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}
