//! Local account record: the authoritative mirror of one mailbox.

use chrono::{DateTime, NaiveDate, Utc};
use mailgov_core::AccountStatus;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// One locally mirrored account.
///
/// Field ownership is split (single writer per field): the reconciliation
/// engine owns the remote-sourced columns and `sync_hash`; the lifecycle
/// service owns `status` and the lifecycle columns. Status columns hold the
/// raw string and parse through [`AccountStatus`] on access.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    /// The directory's stable id. Immutable once set.
    pub directory_id: String,
    pub email: String,
    pub display_name: String,
    pub domain: String,
    /// Locally governed lifecycle status.
    pub status: String,
    /// Last-observed remote status, kept for display and diagnostics only.
    pub remote_status: String,
    pub forwarding_address: String,
    pub mailbox_size: i64,
    pub last_login_at: Option<DateTime<Utc>>,
    pub cos_id: String,
    pub closed_at: Option<DateTime<Utc>>,
    pub purge_eligible_date: Option<NaiveDate>,
    pub purged_at: Option<DateTime<Utc>>,
    pub status_changed_at: Option<DateTime<Utc>>,
    pub status_changed_by: Option<Uuid>,
    /// Fingerprint of the last-seen remote field set.
    pub sync_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Remote-sourced field set the reconciliation engine writes.
#[derive(Debug, Clone)]
pub struct AccountSyncFields {
    pub email: String,
    pub domain: String,
    pub display_name: String,
    pub forwarding_address: String,
    pub cos_id: String,
    /// Mapped remote status for the mirror column.
    pub remote_status: AccountStatus,
    /// `Some` overwrites the local status (never-locally-managed accounts
    /// only); `None` leaves it alone.
    pub status: Option<AccountStatus>,
    /// `Some` replaces the stored size; `None` keeps the existing value.
    pub mailbox_size: Option<i64>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub sync_hash: String,
}

impl Account {
    /// Parsed local status.
    #[must_use]
    pub fn status(&self) -> AccountStatus {
        self.status.parse().unwrap_or(AccountStatus::Active)
    }

    /// Parsed remote-status mirror.
    #[must_use]
    pub fn remote_status(&self) -> AccountStatus {
        self.remote_status.parse().unwrap_or(AccountStatus::Active)
    }

    /// An account with active mail forwarding is protected: it must never be
    /// purged regardless of queue state.
    #[must_use]
    pub fn is_protected(&self) -> bool {
        !self.forwarding_address.is_empty()
    }

    /// Whether an operator has ever changed this account's status locally.
    /// Once true, reconciliation never overwrites `status`.
    #[must_use]
    pub fn is_locally_managed(&self) -> bool {
        self.status_changed_by.is_some()
    }

    /// Human-readable mailbox size for the display layer.
    #[must_use]
    pub fn mailbox_size_display(&self) -> String {
        let mut size = self.mailbox_size as f64;
        for unit in ["B", "KB", "MB", "GB"] {
            if size.abs() < 1024.0 {
                return format!("{size:.1} {unit}");
            }
            size /= 1024.0;
        }
        format!("{size:.1} TB")
    }

    /// Look up by the directory's stable id.
    pub async fn find_by_directory_id(
        pool: &PgPool,
        directory_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM accounts WHERE directory_id = $1")
            .bind(directory_id)
            .fetch_optional(pool)
            .await
    }

    /// Look up by primary email address.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM accounts WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Look up a batch of accounts by email, preserving no particular order.
    pub async fn find_by_emails(pool: &PgPool, emails: &[String]) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM accounts WHERE email = ANY($1)")
            .bind(emails)
            .fetch_all(pool)
            .await
    }

    /// Fetch by primary key.
    pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a freshly discovered account from remote data.
    pub async fn create_from_sync(
        pool: &PgPool,
        directory_id: &str,
        fields: &AccountSyncFields,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO accounts (
                directory_id, email, domain, display_name, forwarding_address,
                cos_id, remote_status, status, mailbox_size, last_login_at, sync_hash
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            ",
        )
        .bind(directory_id)
        .bind(&fields.email)
        .bind(&fields.domain)
        .bind(&fields.display_name)
        .bind(&fields.forwarding_address)
        .bind(&fields.cos_id)
        .bind(fields.remote_status.to_string())
        .bind(
            fields
                .status
                .unwrap_or(AccountStatus::Active)
                .to_string(),
        )
        .bind(fields.mailbox_size.unwrap_or(0))
        .bind(fields.last_login_at)
        .bind(&fields.sync_hash)
        .fetch_one(pool)
        .await
    }

    /// Apply a changed remote field set to an existing account.
    ///
    /// `status` is only overwritten when the planner put a value in
    /// `fields.status`; the remote-status mirror always refreshes.
    pub async fn apply_sync(
        pool: &PgPool,
        id: Uuid,
        fields: &AccountSyncFields,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r"
            UPDATE accounts
            SET
                email = $2,
                domain = $3,
                display_name = $4,
                forwarding_address = $5,
                cos_id = $6,
                remote_status = $7,
                status = COALESCE($8, status),
                mailbox_size = COALESCE($9, mailbox_size),
                last_login_at = COALESCE($10, last_login_at),
                sync_hash = $11,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&fields.email)
        .bind(&fields.domain)
        .bind(&fields.display_name)
        .bind(&fields.forwarding_address)
        .bind(&fields.cos_id)
        .bind(fields.remote_status.to_string())
        .bind(fields.status.map(|s| s.to_string()))
        .bind(fields.mailbox_size)
        .bind(fields.last_login_at)
        .bind(&fields.sync_hash)
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(overrides: impl FnOnce(&mut Account)) -> Account {
        let now = Utc::now();
        let mut account = Account {
            id: Uuid::new_v4(),
            directory_id: "aid-1".to_string(),
            email: "alice@example.com".to_string(),
            display_name: "Alice".to_string(),
            domain: "example.com".to_string(),
            status: "active".to_string(),
            remote_status: "active".to_string(),
            forwarding_address: String::new(),
            mailbox_size: 0,
            last_login_at: None,
            cos_id: String::new(),
            closed_at: None,
            purge_eligible_date: None,
            purged_at: None,
            status_changed_at: None,
            status_changed_by: None,
            sync_hash: String::new(),
            created_at: now,
            updated_at: now,
        };
        overrides(&mut account);
        account
    }

    #[test]
    fn forwarding_address_protects() {
        assert!(!account(|_| {}).is_protected());
        assert!(account(|a| a.forwarding_address = "fwd@example.net".to_string()).is_protected());
    }

    #[test]
    fn operator_touch_marks_locally_managed() {
        assert!(!account(|_| {}).is_locally_managed());
        assert!(account(|a| a.status_changed_by = Some(Uuid::new_v4())).is_locally_managed());
    }

    #[test]
    fn unknown_status_string_reads_as_active() {
        let acct = account(|a| a.status = "corrupted".to_string());
        assert_eq!(acct.status(), AccountStatus::Active);
    }

    #[test]
    fn mailbox_size_display_scales_units() {
        assert_eq!(account(|a| a.mailbox_size = 512).mailbox_size_display(), "512.0 B");
        assert_eq!(
            account(|a| a.mailbox_size = 52_428_800).mailbox_size_display(),
            "50.0 MB"
        );
        assert_eq!(
            account(|a| a.mailbox_size = 2_199_023_255_552).mailbox_size_display(),
            "2.0 TB"
        );
    }
}
