//! Reconciliation engine
//!
//! Pulls the full remote account set page by page, merges it into the local
//! mirror with fingerprint-based change detection, and records one sync-run
//! history row per invocation. The [`scheduler`] module triggers runs on a
//! configurable interval with process-wide exclusivity: scheduled ticks and
//! manual "sync now" requests feed one single-worker queue, so at most one
//! reconciliation is ever active.

pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod plan;
pub mod scheduler;
pub mod store;

pub use engine::{RunSummary, SyncConfig, SyncEngine, SyncErrorDetail};
pub use error::{SyncError, SyncResult};
pub use fingerprint::{compute_fingerprint, FINGERPRINT_SEPARATOR};
pub use plan::{plan_account_sync, SyncPlan};
pub use scheduler::{Scheduler, JOB_ID};
pub use store::{PgSyncStore, SyncStore};
