//! The reconciliation engine.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};

use mailgov_core::{AuditAction, AuditEvent, AuditSink, DirectoryId};
use mailgov_db::SyncRunCounts;
use mailgov_directory::{Directory, RemoteAccount};

use crate::error::{SyncError, SyncResult};
use crate::plan::{plan_account_sync, SyncPlan};
use crate::store::SyncStore;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Directory page size; the listing offset advances by this much.
    pub page_size: u32,
    /// Cap on recorded per-account error details.
    pub max_error_details: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: 500,
            max_error_details: 50,
        }
    }
}

/// One recorded per-account failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncErrorDetail {
    /// Display name or email of the account that failed.
    pub account: String,
    /// Error text.
    pub error: String,
}

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: u32,
    pub created: u32,
    pub updated: u32,
    pub unchanged: u32,
    pub errors: u32,
    /// Capped per-account error list; `errors` keeps the true count.
    pub error_details: Vec<SyncErrorDetail>,
    /// Whether this was a dry run (nothing written, no run record).
    pub dry_run: bool,
}

impl RunSummary {
    fn counts(&self) -> SyncRunCounts {
        SyncRunCounts {
            total: self.total as i32,
            created: self.created as i32,
            updated: self.updated as i32,
            unchanged: self.unchanged as i32,
            errors: self.errors as i32,
        }
    }
}

enum SyncOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Paginated pull-and-merge over the remote account set.
pub struct SyncEngine {
    directory: Arc<dyn Directory>,
    store: Arc<dyn SyncStore>,
    audit: Arc<dyn AuditSink>,
    config: SyncConfig,
}

impl SyncEngine {
    pub fn new(
        directory: Arc<dyn Directory>,
        store: Arc<dyn SyncStore>,
        audit: Arc<dyn AuditSink>,
        config: SyncConfig,
    ) -> Self {
        Self {
            directory,
            store,
            audit,
            config,
        }
    }

    /// Run one full reconciliation pass.
    ///
    /// `domain` restricts the listing to one mail domain when non-empty. In
    /// dry-run mode the pass counts would-be creates and updates without
    /// writing anything: no account rows, no sync-run record, no audit
    /// event.
    ///
    /// Per-account failures are counted and recorded without aborting the
    /// pass. A failure in the listing itself aborts the run, finalizes the
    /// run record as failed, and surfaces the error: a partial listing
    /// cannot be trusted for change detection.
    pub async fn run(&self, domain: &str, dry_run: bool) -> SyncResult<RunSummary> {
        let run_id = if dry_run {
            None
        } else {
            Some(self.store.create_run().await?)
        };

        info!(domain, dry_run, run_id = ?run_id, "starting reconciliation");

        let mut summary = RunSummary {
            dry_run,
            ..RunSummary::default()
        };
        let mut offset = 0u32;

        loop {
            let page = match self
                .directory
                .search_accounts("", domain, self.config.page_size, offset)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    error!(error = %e, offset, "directory listing failed, aborting run");
                    if let Some(run_id) = run_id {
                        let details = json!([{ "error": e.to_string() }]);
                        if let Err(store_err) = self.store.fail_run(run_id, details).await {
                            error!(error = %store_err, "failed to finalize failed run");
                        }
                    }
                    return Err(SyncError::Directory(e));
                }
            };

            let more = page.more;
            for remote in page.accounts {
                summary.total += 1;
                match self.sync_one(&remote, dry_run).await {
                    Ok(SyncOutcome::Created) => summary.created += 1,
                    Ok(SyncOutcome::Updated) => summary.updated += 1,
                    Ok(SyncOutcome::Unchanged) => summary.unchanged += 1,
                    Err(e) => {
                        summary.errors += 1;
                        let account = if remote.display_name.is_empty() {
                            remote.name.clone()
                        } else {
                            remote.display_name.clone()
                        };
                        error!(account = %account, error = %e, "account sync failed");
                        if summary.error_details.len() < self.config.max_error_details {
                            summary.error_details.push(SyncErrorDetail {
                                account,
                                error: e.to_string(),
                            });
                        }
                    }
                }
            }

            if !more {
                break;
            }
            offset += self.config.page_size;
        }

        if let Some(run_id) = run_id {
            let details = serde_json::to_value(&summary.error_details)
                .unwrap_or_else(|_| json!([]));
            self.store
                .complete_run(run_id, summary.counts(), details)
                .await?;

            let event = AuditEvent::new(AuditAction::Sync, "sync", run_id.to_string())
                .with_details(json!({
                    "total": summary.total,
                    "created": summary.created,
                    "updated": summary.updated,
                    "unchanged": summary.unchanged,
                    "errors": summary.errors,
                }));
            if let Err(e) = self.audit.record(event).await {
                warn!(error = %e, "failed to record sync audit event");
            }
        }

        info!(
            total = summary.total,
            created = summary.created,
            updated = summary.updated,
            unchanged = summary.unchanged,
            errors = summary.errors,
            dry_run,
            "reconciliation complete"
        );

        Ok(summary)
    }

    /// Merge one remote record. Store failures here are per-account errors,
    /// caught and counted by the caller.
    async fn sync_one(&self, remote: &RemoteAccount, dry_run: bool) -> SyncResult<SyncOutcome> {
        let local = self
            .store
            .find_account_by_directory_id(remote.id.as_str())
            .await?;

        match plan_account_sync(local.as_ref(), remote) {
            SyncPlan::Unchanged => Ok(SyncOutcome::Unchanged),
            SyncPlan::Create(mut fields) => {
                if dry_run {
                    return Ok(SyncOutcome::Created);
                }
                fields.mailbox_size = self.fetch_mailbox_size(&remote.id).await;
                self.store
                    .insert_account(remote.id.as_str(), &fields)
                    .await?;
                debug!(account = %fields.email, "created account from directory");
                Ok(SyncOutcome::Created)
            }
            SyncPlan::Update { account_id, fields } => {
                if dry_run {
                    return Ok(SyncOutcome::Updated);
                }
                let mut fields = fields;
                fields.mailbox_size = self.fetch_mailbox_size(&remote.id).await;
                self.store.update_account(account_id, &fields).await?;
                debug!(account = %fields.email, "updated account from directory");
                Ok(SyncOutcome::Updated)
            }
        }
    }

    /// Best-effort mailbox size lookup. Failures are swallowed: the size is
    /// telemetry, and a broken mailbox endpoint must not fail account sync.
    async fn fetch_mailbox_size(&self, id: &DirectoryId) -> Option<i64> {
        match self.directory.get_mailbox_size(id).await {
            Ok(size) => Some(size as i64),
            Err(e) => {
                debug!(account = %id, error = %e, "mailbox size lookup failed");
                None
            }
        }
    }
}
