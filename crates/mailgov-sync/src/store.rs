//! Store seam for the reconciliation engine.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use mailgov_core::{StoreError, StoreResult};
use mailgov_db::{Account, AccountSyncFields, SyncRun, SyncRunCounts};

/// The store operations the engine performs.
///
/// Implemented over Postgres by [`PgSyncStore`]; engine tests substitute an
/// in-memory fake.
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Look up the local mirror of a remote account.
    async fn find_account_by_directory_id(
        &self,
        directory_id: &str,
    ) -> StoreResult<Option<Account>>;

    /// Insert a freshly discovered account.
    async fn insert_account(
        &self,
        directory_id: &str,
        fields: &AccountSyncFields,
    ) -> StoreResult<Account>;

    /// Apply a changed remote field set to an existing account.
    async fn update_account(&self, id: Uuid, fields: &AccountSyncFields) -> StoreResult<()>;

    /// Open a sync-run record in `running` state.
    async fn create_run(&self) -> StoreResult<Uuid>;

    /// Finalize a run as completed with its counts.
    async fn complete_run(
        &self,
        id: Uuid,
        counts: SyncRunCounts,
        error_details: JsonValue,
    ) -> StoreResult<()>;

    /// Finalize a run as failed.
    async fn fail_run(&self, id: Uuid, error_details: JsonValue) -> StoreResult<()>;
}

/// Postgres-backed sync store.
#[derive(Debug, Clone)]
pub struct PgSyncStore {
    pool: PgPool,
}

impl PgSyncStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncStore for PgSyncStore {
    async fn find_account_by_directory_id(
        &self,
        directory_id: &str,
    ) -> StoreResult<Option<Account>> {
        Account::find_by_directory_id(&self.pool, directory_id)
            .await
            .map_err(StoreError::database)
    }

    async fn insert_account(
        &self,
        directory_id: &str,
        fields: &AccountSyncFields,
    ) -> StoreResult<Account> {
        Account::create_from_sync(&self.pool, directory_id, fields)
            .await
            .map_err(StoreError::database)
    }

    async fn update_account(&self, id: Uuid, fields: &AccountSyncFields) -> StoreResult<()> {
        Account::apply_sync(&self.pool, id, fields)
            .await
            .map_err(StoreError::database)
    }

    async fn create_run(&self) -> StoreResult<Uuid> {
        let run = SyncRun::create(&self.pool)
            .await
            .map_err(StoreError::database)?;
        Ok(run.id)
    }

    async fn complete_run(
        &self,
        id: Uuid,
        counts: SyncRunCounts,
        error_details: JsonValue,
    ) -> StoreResult<()> {
        SyncRun::complete(&self.pool, id, counts, error_details)
            .await
            .map_err(StoreError::database)
    }

    async fn fail_run(&self, id: Uuid, error_details: JsonValue) -> StoreResult<()> {
        SyncRun::fail(&self.pool, id, error_details)
            .await
            .map_err(StoreError::database)
    }
}
