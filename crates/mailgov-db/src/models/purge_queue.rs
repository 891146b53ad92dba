//! Purge queue: scheduled-deletion intents with an eligibility date.

use chrono::{DateTime, NaiveDate, Utc};
use mailgov_core::PurgeEntryStatus;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// One scheduled deletion intent. Many-to-one with accounts; the lifecycle
/// service keeps at most one entry open per account.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PurgeQueueEntry {
    pub id: Uuid,
    pub account_id: Uuid,
    /// Date at or after which the entry may execute.
    pub eligible_date: NaiveDate,
    pub status: String,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub skipped_reason: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PurgeQueueEntry {
    /// Parsed entry status.
    #[must_use]
    pub fn status(&self) -> PurgeEntryStatus {
        self.status.parse().unwrap_or(PurgeEntryStatus::Waiting)
    }

    /// Insert a fresh `waiting` entry.
    pub async fn create(
        pool: &PgPool,
        account_id: Uuid,
        eligible_date: NaiveDate,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO purge_queue (account_id, eligible_date, status)
            VALUES ($1, $2, 'waiting')
            RETURNING *
            ",
        )
        .bind(account_id)
        .bind(eligible_date)
        .fetch_one(pool)
        .await
    }

    /// All `waiting` entries whose eligibility date has arrived.
    pub async fn due_waiting(pool: &PgPool, today: NaiveDate) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM purge_queue
            WHERE status = 'waiting' AND eligible_date <= $1
            ORDER BY eligible_date, created_at
            ",
        )
        .bind(today)
        .fetch_all(pool)
        .await
    }

    /// Cancel every open (`waiting`/`approved`) entry for an account.
    /// Returns the number of entries cancelled.
    pub async fn cancel_open_for_account(
        pool: &PgPool,
        account_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r"
            UPDATE purge_queue
            SET status = 'cancelled', updated_at = NOW()
            WHERE account_id = $1 AND status IN ('waiting', 'approved')
            ",
        )
        .bind(account_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Move an entry to a terminal status, with an optional skip reason.
    pub async fn mark(
        pool: &PgPool,
        id: Uuid,
        status: PurgeEntryStatus,
        skipped_reason: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r"
            UPDATE purge_queue
            SET status = $2,
                skipped_reason = COALESCE($3, skipped_reason),
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(status.to_string())
        .bind(skipped_reason)
        .execute(pool)
        .await?;
        Ok(())
    }
}
