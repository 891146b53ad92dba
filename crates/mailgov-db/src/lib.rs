//! mailgov database layer
//!
//! Postgres models for the local mirror (accounts, purge queue, sync runs,
//! audit log, settings) plus implementations of the collaborator traits from
//! `mailgov-core` over those tables.

pub mod error;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod sinks;

pub use error::DbError;
pub use migrations::run_migrations;
pub use models::account::{Account, AccountSyncFields};
pub use models::audit_log::AuditLog;
pub use models::purge_queue::PurgeQueueEntry;
pub use models::setting::Setting;
pub use models::sync_run::{SyncRun, SyncRunCounts};
pub use pool::connect;
pub use sinks::{PgAuditSink, PgSettingsStore};
