//! Store seam for the lifecycle service and purge processor.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use mailgov_core::{AccountStatus, ActorId, PurgeEntryStatus, StoreError, StoreResult};
use mailgov_db::{Account, PurgeQueueEntry};

/// The local effects of one accepted transition, applied atomically after
/// the remote push succeeded.
#[derive(Debug, Clone)]
pub struct TransitionRecord {
    pub new_status: AccountStatus,
    /// Refresh the remote-status mirror when the target exists remotely.
    pub remote_status: Option<AccountStatus>,
    pub changed_at: DateTime<Utc>,
    pub changed_by: Option<ActorId>,
    /// Close side effects; `Some` exactly when the target is `closed`.
    pub close: Option<CloseEffects>,
    /// Reactivation side effects; `true` exactly when the target is `active`.
    pub reactivate: bool,
}

/// Side effects of closing an account.
#[derive(Debug, Clone, Copy)]
pub struct CloseEffects {
    pub closed_at: DateTime<Utc>,
    pub purge_eligible_date: NaiveDate,
}

/// Store operations the lifecycle layer performs.
#[async_trait]
pub trait LifecycleStore: Send + Sync {
    async fn find_account(&self, id: Uuid) -> StoreResult<Option<Account>>;

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    async fn find_accounts_by_emails(&self, emails: &[String]) -> StoreResult<Vec<Account>>;

    /// Apply one transition's local mutations as a single atomic change:
    /// status fields, the remote-status mirror, close/reactivate effects,
    /// and the purge-queue bookkeeping they imply. Closing cancels any
    /// still-open entries before inserting the new one, so at most one open
    /// entry exists per account.
    async fn apply_transition(&self, account_id: Uuid, record: TransitionRecord)
        -> StoreResult<()>;

    /// `waiting` purge entries whose eligibility date has arrived.
    async fn due_purge_entries(&self, today: NaiveDate) -> StoreResult<Vec<PurgeQueueEntry>>;

    /// Move a queue entry to a terminal status, with an optional skip reason.
    async fn mark_entry(
        &self,
        entry_id: Uuid,
        status: PurgeEntryStatus,
        reason: Option<&str>,
    ) -> StoreResult<()>;

    /// Record an executed purge: account `purged` + `purged_at`, entry
    /// `executed`, atomically.
    async fn mark_purged(
        &self,
        account_id: Uuid,
        entry_id: Uuid,
        purged_at: DateTime<Utc>,
    ) -> StoreResult<()>;
}

/// Postgres-backed lifecycle store.
#[derive(Debug, Clone)]
pub struct PgLifecycleStore {
    pool: PgPool,
}

impl PgLifecycleStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LifecycleStore for PgLifecycleStore {
    async fn find_account(&self, id: Uuid) -> StoreResult<Option<Account>> {
        Account::find(&self.pool, id)
            .await
            .map_err(StoreError::database)
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        Account::find_by_email(&self.pool, email)
            .await
            .map_err(StoreError::database)
    }

    async fn find_accounts_by_emails(&self, emails: &[String]) -> StoreResult<Vec<Account>> {
        Account::find_by_emails(&self.pool, emails)
            .await
            .map_err(StoreError::database)
    }

    async fn apply_transition(
        &self,
        account_id: Uuid,
        record: TransitionRecord,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(StoreError::database)?;

        sqlx::query(
            r"
            UPDATE accounts
            SET status = $2,
                status_changed_at = $3,
                status_changed_by = $4,
                remote_status = COALESCE($5, remote_status),
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(account_id)
        .bind(record.new_status.to_string())
        .bind(record.changed_at)
        .bind(record.changed_by.map(|a| a.as_uuid()))
        .bind(record.remote_status.map(|s| s.to_string()))
        .execute(&mut *tx)
        .await
        .map_err(StoreError::database)?;

        if let Some(close) = record.close {
            sqlx::query(
                r"
                UPDATE accounts
                SET closed_at = $2, purge_eligible_date = $3, updated_at = NOW()
                WHERE id = $1
                ",
            )
            .bind(account_id)
            .bind(close.closed_at)
            .bind(close.purge_eligible_date)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::database)?;

            // At most one open entry per account: close out leftovers first.
            sqlx::query(
                r"
                UPDATE purge_queue
                SET status = 'cancelled', updated_at = NOW()
                WHERE account_id = $1 AND status IN ('waiting', 'approved')
                ",
            )
            .bind(account_id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::database)?;

            sqlx::query(
                r"
                INSERT INTO purge_queue (account_id, eligible_date, status)
                VALUES ($1, $2, 'waiting')
                ",
            )
            .bind(account_id)
            .bind(close.purge_eligible_date)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::database)?;
        }

        if record.reactivate {
            sqlx::query(
                r"
                UPDATE accounts
                SET closed_at = NULL, purge_eligible_date = NULL, updated_at = NOW()
                WHERE id = $1
                ",
            )
            .bind(account_id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::database)?;

            sqlx::query(
                r"
                UPDATE purge_queue
                SET status = 'cancelled', updated_at = NOW()
                WHERE account_id = $1 AND status IN ('waiting', 'approved')
                ",
            )
            .bind(account_id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::database)?;
        }

        tx.commit().await.map_err(StoreError::database)
    }

    async fn due_purge_entries(&self, today: NaiveDate) -> StoreResult<Vec<PurgeQueueEntry>> {
        PurgeQueueEntry::due_waiting(&self.pool, today)
            .await
            .map_err(StoreError::database)
    }

    async fn mark_entry(
        &self,
        entry_id: Uuid,
        status: PurgeEntryStatus,
        reason: Option<&str>,
    ) -> StoreResult<()> {
        PurgeQueueEntry::mark(&self.pool, entry_id, status, reason)
            .await
            .map_err(StoreError::database)
    }

    async fn mark_purged(
        &self,
        account_id: Uuid,
        entry_id: Uuid,
        purged_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(StoreError::database)?;

        sqlx::query(
            r"
            UPDATE accounts
            SET status = 'purged', purged_at = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(account_id)
        .bind(purged_at)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::database)?;

        sqlx::query(
            r"
            UPDATE purge_queue
            SET status = 'executed', updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(entry_id)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::database)?;

        tx.commit().await.map_err(StoreError::database)
    }
}
