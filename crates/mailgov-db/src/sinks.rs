//! Postgres implementations of the collaborator traits.

use async_trait::async_trait;
use sqlx::PgPool;

use mailgov_core::{AuditEvent, AuditSink, SettingsStore, StoreError};

use crate::models::audit_log::AuditLog;
use crate::models::setting::Setting;

/// Audit sink writing to the `audit_log` table.
#[derive(Debug, Clone)]
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), StoreError> {
        AuditLog::record(&self.pool, &event)
            .await
            .map_err(StoreError::database)?;
        Ok(())
    }
}

/// Settings store over the `settings` table.
#[derive(Debug, Clone)]
pub struct PgSettingsStore {
    pool: PgPool,
}

impl PgSettingsStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn get(&self, key: &str, default: &str) -> Result<String, StoreError> {
        Setting::get(&self.pool, key, default)
            .await
            .map_err(StoreError::database)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Setting::set(&self.pool, key, value)
            .await
            .map_err(StoreError::database)
    }
}
