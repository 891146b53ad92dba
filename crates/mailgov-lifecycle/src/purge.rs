//! The purge processor.
//!
//! Scans the purge queue for due entries and re-validates each against
//! current account state before anything irreversible happens: protected
//! accounts are skipped, reactivated accounts have their stale entries
//! cancelled, and only then does the remote deletion run.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use mailgov_core::{AuditAction, AuditEvent, DirectoryId, PurgeEntryStatus};

use crate::error::LifecycleResult;
use crate::service::LifecycleService;

/// One per-entry outcome line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeDetail {
    pub email: String,
    /// `purged`, `would_purge`, `skipped`, or `error`.
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Counts plus per-entry details for one processing pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurgeResults {
    pub processed: u32,
    pub purged: u32,
    pub skipped: u32,
    pub errors: u32,
    pub details: Vec<PurgeDetail>,
}

/// Processes due purge-queue entries through the lifecycle service's
/// collaborators.
pub struct PurgeProcessor<'a> {
    service: &'a LifecycleService,
}

impl<'a> PurgeProcessor<'a> {
    #[must_use]
    pub fn new(service: &'a LifecycleService) -> Self {
        Self { service }
    }

    /// Process every `waiting` entry whose eligibility date has arrived.
    ///
    /// Re-validation order per entry: a vanished account is skipped
    /// silently; a protected account marks the entry `skipped` (persisted
    /// even under dry-run; the protection question is answered either way,
    /// and no deletion is ever attempted); an account no longer closed or
    /// pending purge marks the entry `cancelled`. In dry-run mode the
    /// remaining entries count as would-be purges with nothing written. A
    /// remote deletion failure counts as an error and leaves the entry
    /// `waiting` for the next pass.
    pub async fn process(&self, dry_run: bool) -> LifecycleResult<PurgeResults> {
        let today = Utc::now().date_naive();
        let entries = self.service.store().due_purge_entries(today).await?;

        info!(due = entries.len(), dry_run, "processing purge queue");

        let mut results = PurgeResults::default();

        for entry in entries {
            let Some(account) = self.service.store().find_account(entry.account_id).await? else {
                // Data consistency issue, not a reportable error.
                continue;
            };
            results.processed += 1;

            if account.is_protected() {
                let reason = format!("protected: forwarding to {}", account.forwarding_address);
                self.service
                    .store()
                    .mark_entry(entry.id, PurgeEntryStatus::Skipped, Some(&reason))
                    .await?;
                results.skipped += 1;
                results.details.push(PurgeDetail {
                    email: account.email.clone(),
                    action: "skipped".to_string(),
                    reason: Some(reason),
                });
                continue;
            }

            if !account.status().is_purgeable() {
                // Reactivated after the entry was created; normally the
                // transition cancels entries, but stale ones are defused
                // here too.
                self.service
                    .store()
                    .mark_entry(entry.id, PurgeEntryStatus::Cancelled, None)
                    .await?;
                results.skipped += 1;
                results.details.push(PurgeDetail {
                    email: account.email.clone(),
                    action: "skipped".to_string(),
                    reason: Some(format!("account status is {}", account.status())),
                });
                continue;
            }

            if dry_run {
                results.purged += 1;
                results.details.push(PurgeDetail {
                    email: account.email.clone(),
                    action: "would_purge".to_string(),
                    reason: None,
                });
                continue;
            }

            let directory_id = DirectoryId::new(account.directory_id.clone());
            match self.service.directory().delete_account(&directory_id).await {
                Ok(()) => {
                    self.service
                        .store()
                        .mark_purged(account.id, entry.id, Utc::now())
                        .await?;

                    let event =
                        AuditEvent::new(AuditAction::Purge, "account", account.id.to_string())
                            .with_details(json!({ "email": account.email }));
                    if let Err(e) = self.service.audit().record(event).await {
                        tracing::warn!(error = %e, "failed to record purge audit event");
                    }

                    info!(account = %account.email, "account purged");
                    results.purged += 1;
                    results.details.push(PurgeDetail {
                        email: account.email.clone(),
                        action: "purged".to_string(),
                        reason: None,
                    });
                }
                Err(e) => {
                    // Entry stays waiting; the next pass retries.
                    error!(account = %account.email, error = %e, "purge failed");
                    results.errors += 1;
                    results.details.push(PurgeDetail {
                        email: account.email.clone(),
                        action: "error".to_string(),
                        reason: Some(e.to_string()),
                    });
                }
            }
        }

        info!(
            processed = results.processed,
            purged = results.purged,
            skipped = results.skipped,
            errors = results.errors,
            dry_run,
            "purge queue pass complete"
        );

        Ok(results)
    }
}
