//! Sync run history: one record per reconciliation invocation.

use chrono::{DateTime, Utc};
use mailgov_core::SyncRunStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Final counters for a reconciliation run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SyncRunCounts {
    pub total: i32,
    pub created: i32,
    pub updated: i32,
    pub unchanged: i32,
    pub errors: i32,
}

/// One reconciliation run record. Created `running`, finalized exactly once;
/// immutable after that.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SyncRun {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: String,
    pub total_count: i32,
    pub created_count: i32,
    pub updated_count: i32,
    pub unchanged_count: i32,
    pub error_count: i32,
    /// Bounded list of per-account error descriptions.
    pub error_details: JsonValue,
}

impl SyncRun {
    /// Parsed run status.
    #[must_use]
    pub fn status(&self) -> SyncRunStatus {
        self.status.parse().unwrap_or(SyncRunStatus::Running)
    }

    /// Wall-clock duration, once finalized.
    #[must_use]
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.completed_at.map(|end| end - self.started_at)
    }

    /// Open a new run in `running` state.
    pub async fn create(pool: &PgPool) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO sync_runs (status) VALUES ('running')
            RETURNING *
            ",
        )
        .fetch_one(pool)
        .await
    }

    /// Finalize as completed with final counts.
    pub async fn complete(
        pool: &PgPool,
        id: Uuid,
        counts: SyncRunCounts,
        error_details: JsonValue,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r"
            UPDATE sync_runs
            SET status = 'completed',
                completed_at = NOW(),
                total_count = $2,
                created_count = $3,
                updated_count = $4,
                unchanged_count = $5,
                error_count = $6,
                error_details = $7
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(counts.total)
        .bind(counts.created)
        .bind(counts.updated)
        .bind(counts.unchanged)
        .bind(counts.errors)
        .bind(error_details)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Finalize as failed. The counts are recorded for diagnostics but must
    /// not be trusted as a directory inventory.
    pub async fn fail(
        pool: &PgPool,
        id: Uuid,
        error_details: JsonValue,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r"
            UPDATE sync_runs
            SET status = 'failed',
                completed_at = NOW(),
                error_details = $2
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(error_details)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Most recent runs, newest first.
    pub async fn recent(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM sync_runs ORDER BY started_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
