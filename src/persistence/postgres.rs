//! PostgreSQL implementation of the persistence layer.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::models::StoredEvent;
use crate::engine::EngineSnapshot;
use crate::error::EngineError;

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `pairing_events` and `engine_snapshots` tables if absent.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError::PersistenceError`] on database failure.
    pub async fn init_schema(&self) -> Result<(), EngineError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS pairing_events ( \
               id BIGSERIAL PRIMARY KEY, \
               event_type TEXT NOT NULL, \
               payload JSONB NOT NULL, \
               created_at TIMESTAMPTZ NOT NULL DEFAULT now() \
             )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| EngineError::PersistenceError(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS engine_snapshots ( \
               id BIGSERIAL PRIMARY KEY, \
               round BIGINT NOT NULL, \
               state_json JSONB NOT NULL, \
               snapshot_at TIMESTAMPTZ NOT NULL DEFAULT now() \
             )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| EngineError::PersistenceError(e.to_string()))?;

        Ok(())
    }

    /// Appends an event to the event log.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError::PersistenceError`] on database failure.
    pub async fn save_event(
        &self,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<i64, EngineError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO pairing_events (event_type, payload) VALUES ($1, $2) RETURNING id",
        )
        .bind(event_type)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| EngineError::PersistenceError(e.to_string()))?;

        Ok(row)
    }

    /// Checkpoints the engine state after a round.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError::PersistenceError`] on database failure
    /// or if the snapshot cannot be serialized.
    pub async fn save_snapshot(&self, snapshot: &EngineSnapshot) -> Result<i64, EngineError> {
        let state_json = serde_json::to_value(snapshot)
            .map_err(|e| EngineError::PersistenceError(e.to_string()))?;
        let round = i64::try_from(snapshot.round).unwrap_or(i64::MAX);

        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO engine_snapshots (round, state_json) VALUES ($1, $2) RETURNING id",
        )
        .bind(round)
        .bind(state_json)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| EngineError::PersistenceError(e.to_string()))?;

        Ok(row)
    }

    /// Loads the most recent engine snapshot, if any exists.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError::PersistenceError`] on database failure
    /// or if the stored state cannot be deserialized.
    pub async fn load_latest_snapshot(&self) -> Result<Option<EngineSnapshot>, EngineError> {
        let row = sqlx::query_as::<_, (i64, i64, serde_json::Value, DateTime<Utc>)>(
            "SELECT id, round, state_json, snapshot_at FROM engine_snapshots \
             ORDER BY snapshot_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| EngineError::PersistenceError(e.to_string()))?;

        let Some((_, _, state_json, _)) = row else {
            return Ok(None);
        };

        let snapshot: EngineSnapshot = serde_json::from_value(state_json)
            .map_err(|e| EngineError::PersistenceError(e.to_string()))?;
        Ok(Some(snapshot))
    }

    /// Loads events after the given timestamp in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError::PersistenceError`] on database failure.
    pub async fn load_events_after(
        &self,
        after: DateTime<Utc>,
    ) -> Result<Vec<StoredEvent>, EngineError> {
        let rows = sqlx::query_as::<_, (i64, String, serde_json::Value, DateTime<Utc>)>(
            "SELECT id, event_type, payload, created_at FROM pairing_events \
             WHERE created_at > $1 ORDER BY id ASC",
        )
        .bind(after)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EngineError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, event_type, payload, created_at)| StoredEvent {
                id,
                event_type,
                payload,
                created_at,
            })
            .collect())
    }

    /// Deletes snapshots older than the given number of days.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError::PersistenceError`] on database failure.
    pub async fn delete_old_snapshots(&self, before_days: u64) -> Result<u64, EngineError> {
        let cutoff =
            Utc::now() - chrono::Duration::days(i64::try_from(before_days).unwrap_or(i64::MAX));

        let result = sqlx::query("DELETE FROM engine_snapshots WHERE snapshot_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| EngineError::PersistenceError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
