//! Bulk lifecycle operations over account email lists.
//!
//! CSV parsing and upload handling live in the (out of scope) HTTP layer;
//! this module takes the already-extracted email list, applies one
//! transition to every account it can find, and reports per-account results
//! without aborting the batch.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use tracing::{info, warn};

use mailgov_core::{AccountStatus, ActorId, AuditAction, AuditEvent};

use crate::error::LifecycleResult;
use crate::service::LifecycleService;

/// The bulk operation vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkOperationKind {
    Lock,
    Close,
    Reactivate,
}

impl BulkOperationKind {
    /// The lifecycle target this operation drives each account toward.
    #[must_use]
    pub fn target_status(&self) -> AccountStatus {
        match self {
            Self::Lock => AccountStatus::Locked,
            Self::Close => AccountStatus::Closed,
            Self::Reactivate => AccountStatus::Active,
        }
    }
}

impl fmt::Display for BulkOperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lock => write!(f, "lock"),
            Self::Close => write!(f, "close"),
            Self::Reactivate => write!(f, "reactivate"),
        }
    }
}

/// Per-account result line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItemResult {
    pub email: String,
    pub ok: bool,
    pub message: String,
}

/// Outcome of one bulk operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkReport {
    /// Emails requested.
    pub total: u32,
    /// Accounts actually processed (found locally).
    pub processed: u32,
    /// Processed accounts whose transition was rejected or failed remotely.
    pub errors: u32,
    /// Emails with no local account.
    pub not_found: Vec<String>,
    pub results: Vec<BulkItemResult>,
}

impl BulkReport {
    /// Processed accounts whose transition succeeded.
    #[must_use]
    pub fn succeeded(&self) -> u32 {
        self.processed - self.errors
    }
}

impl LifecycleService {
    /// Apply one lifecycle transition to every listed account.
    ///
    /// Unknown emails are collected, not errors; per-account rejections and
    /// remote failures are reported in the item results and never abort the
    /// batch. One `bulk_op` audit event summarizes the outcome.
    pub async fn bulk_change_status(
        &self,
        kind: BulkOperationKind,
        emails: &[String],
        actor: Option<ActorId>,
        reason: &str,
    ) -> LifecycleResult<BulkReport> {
        let target = kind.target_status();
        let accounts = self.store().find_accounts_by_emails(emails).await?;

        let mut report = BulkReport {
            total: emails.len() as u32,
            ..BulkReport::default()
        };

        for email in emails {
            if !accounts.iter().any(|a| &a.email == email) {
                report.not_found.push(email.clone());
            }
        }

        for account in &accounts {
            let outcome = self.change_status(account, target, actor, reason).await?;
            report.processed += 1;
            if !outcome.ok {
                report.errors += 1;
            }
            report.results.push(BulkItemResult {
                email: account.email.clone(),
                ok: outcome.ok,
                message: outcome.message,
            });
        }

        let event = AuditEvent::new(AuditAction::BulkOp, "bulk_operation", kind.to_string())
            .by(actor)
            .with_details(json!({
                "operation": kind.to_string(),
                "total": report.total,
                "processed": report.processed,
                "errors": report.errors,
                "not_found": report.not_found.len(),
            }));
        if let Err(e) = self.audit().record(event).await {
            warn!(error = %e, "failed to record bulk-operation audit event");
        }

        info!(
            operation = %kind,
            total = report.total,
            processed = report.processed,
            errors = report.errors,
            not_found = report.not_found.len(),
            "bulk operation complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_targets() {
        assert_eq!(BulkOperationKind::Lock.target_status(), AccountStatus::Locked);
        assert_eq!(BulkOperationKind::Close.target_status(), AccountStatus::Closed);
        assert_eq!(
            BulkOperationKind::Reactivate.target_status(),
            AccountStatus::Active
        );
    }
}
