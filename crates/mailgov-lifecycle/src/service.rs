//! The lifecycle state machine service.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use mailgov_core::{
    AccountStatus, ActorId, AuditAction, AuditEvent, AuditSink, DirectoryId,
};
use mailgov_db::Account;
use mailgov_directory::{remote_status_for, Directory};

use crate::error::LifecycleResult;
use crate::store::{CloseEffects, LifecycleStore, TransitionRecord};
use crate::transitions::check_transition;

/// Lifecycle configuration.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Days between closing an account and its purge eligibility.
    pub purge_delay_days: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            purge_delay_days: 60,
        }
    }
}

/// Result of a transition request: a success flag and a human-readable
/// message either way. Business-rule rejections land here, never in `Err`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub ok: bool,
    pub message: String,
}

impl TransitionOutcome {
    pub(crate) fn accepted(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub(crate) fn rejected(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Central business logic for account lifecycle management.
pub struct LifecycleService {
    store: Arc<dyn LifecycleStore>,
    directory: Arc<dyn Directory>,
    audit: Arc<dyn AuditSink>,
    config: LifecycleConfig,
}

impl LifecycleService {
    pub fn new(
        store: Arc<dyn LifecycleStore>,
        directory: Arc<dyn Directory>,
        audit: Arc<dyn AuditSink>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            store,
            directory,
            audit,
            config,
        }
    }

    pub(crate) fn store(&self) -> &Arc<dyn LifecycleStore> {
        &self.store
    }

    pub(crate) fn directory(&self) -> &Arc<dyn Directory> {
        &self.directory
    }

    pub(crate) fn audit(&self) -> &Arc<dyn AuditSink> {
        &self.audit
    }

    /// Look up an account by email for a lifecycle operation.
    pub async fn account_by_email(&self, email: &str) -> LifecycleResult<Option<Account>> {
        Ok(self.store.find_account_by_email(email).await?)
    }

    /// Change an account's status with full lifecycle rule enforcement.
    ///
    /// The remote push happens first; a directory failure aborts the whole
    /// transition with no local mutation and the remote error in the
    /// outcome. On success the local change (status fields, mirror, close
    /// or reactivate side effects, purge-queue bookkeeping) commits
    /// atomically, and one audit event is emitted.
    pub async fn change_status(
        &self,
        account: &Account,
        target: AccountStatus,
        actor: Option<ActorId>,
        reason: &str,
    ) -> LifecycleResult<TransitionOutcome> {
        let current = account.status();

        if let Err(message) = check_transition(current, target) {
            return Ok(TransitionOutcome::rejected(message));
        }

        let now = Utc::now();
        let pushes_remote = remote_status_for(target).is_some();

        // Remote first: no local mutation may survive a failed push.
        if pushes_remote {
            let directory_id = DirectoryId::new(account.directory_id.clone());
            if let Err(e) = self.directory.set_account_status(&directory_id, target).await {
                error!(account = %account.email, error = %e, "remote status change failed");
                return Ok(TransitionOutcome::rejected(format!(
                    "directory error: {e}"
                )));
            }
        }

        let record = TransitionRecord {
            new_status: target,
            remote_status: pushes_remote.then_some(target),
            changed_at: now,
            changed_by: actor,
            close: (target == AccountStatus::Closed).then(|| CloseEffects {
                closed_at: now,
                purge_eligible_date: (now
                    + Duration::days(i64::from(self.config.purge_delay_days)))
                .date_naive(),
            }),
            reactivate: target == AccountStatus::Active,
        };
        self.store.apply_transition(account.id, record).await?;

        let event = AuditEvent::new(AuditAction::StatusChange, "account", account.id.to_string())
            .by(actor)
            .with_details(json!({
                "email": account.email,
                "old_status": current.to_string(),
                "new_status": target.to_string(),
                "reason": reason,
            }));
        if let Err(e) = self.audit.record(event).await {
            warn!(error = %e, "failed to record status-change audit event");
        }

        info!(
            account = %account.email,
            old_status = %current,
            new_status = %target,
            actor = ?actor,
            "account status changed"
        );

        Ok(TransitionOutcome::accepted(format!(
            "status changed from {current} to {target}"
        )))
    }
}
