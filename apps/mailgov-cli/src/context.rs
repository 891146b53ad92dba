//! Shared wiring: configuration, pool, directory client, services.

use std::sync::Arc;

use anyhow::Context as _;
use sqlx::PgPool;

use mailgov_core::AppConfig;
use mailgov_db::{PgAuditSink, PgSettingsStore};
use mailgov_directory::SoapClient;
use mailgov_lifecycle::{LifecycleConfig, LifecycleService, PgLifecycleStore};
use mailgov_sync::{PgSyncStore, SyncConfig, SyncEngine};

/// Everything a command needs, built once per invocation.
pub struct AppContext {
    pub config: AppConfig,
    pub pool: PgPool,
    pub directory: Arc<SoapClient>,
    pub audit: Arc<PgAuditSink>,
    pub settings: Arc<PgSettingsStore>,
}

impl AppContext {
    /// Load configuration, connect to Postgres, apply migrations, and build
    /// the directory client.
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env().context("loading configuration")?;

        let pool = mailgov_db::connect(&config.database_url)
            .await
            .context("connecting to database")?;
        mailgov_db::run_migrations(&pool)
            .await
            .context("applying migrations")?;

        let directory = Arc::new(
            SoapClient::new(config.directory.clone()).context("building directory client")?,
        );
        let audit = Arc::new(PgAuditSink::new(pool.clone()));
        let settings = Arc::new(PgSettingsStore::new(pool.clone()));

        Ok(Self {
            config,
            pool,
            directory,
            audit,
            settings,
        })
    }

    /// Reconciliation engine over the shared pool and directory client.
    pub fn sync_engine(&self) -> SyncEngine {
        SyncEngine::new(
            self.directory.clone(),
            Arc::new(PgSyncStore::new(self.pool.clone())),
            self.audit.clone(),
            SyncConfig {
                page_size: self.config.sync_page_size,
                ..SyncConfig::default()
            },
        )
    }

    /// Lifecycle service over the shared pool and directory client.
    pub fn lifecycle(&self) -> LifecycleService {
        LifecycleService::new(
            Arc::new(PgLifecycleStore::new(self.pool.clone())),
            self.directory.clone(),
            self.audit.clone(),
            LifecycleConfig {
                purge_delay_days: self.config.purge_delay_days,
            },
        )
    }
}
