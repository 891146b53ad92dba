//! Merge planning: what one remote record means for the local mirror.
//!
//! Pure decision logic, separated from the engine's I/O so the precedence
//! rules are testable without a store.

use uuid::Uuid;

use mailgov_db::{Account, AccountSyncFields};
use mailgov_directory::RemoteAccount;

use crate::fingerprint::compute_fingerprint;

/// The engine's decision for one remote record.
#[derive(Debug, Clone)]
pub enum SyncPlan {
    /// No local account with this directory id exists yet.
    Create(AccountSyncFields),
    /// The fingerprint changed; apply the new field set to the local row.
    Update {
        account_id: Uuid,
        fields: AccountSyncFields,
    },
    /// Fingerprint unchanged; write nothing.
    Unchanged,
}

/// Decide how a remote record merges into the local mirror.
///
/// Local operator intent wins on status: once `status_changed_by` is set the
/// mapped remote status never overwrites the local status, though the
/// remote-status mirror still refreshes on every update.
#[must_use]
pub fn plan_account_sync(local: Option<&Account>, remote: &RemoteAccount) -> SyncPlan {
    let fingerprint = compute_fingerprint(remote);

    match local {
        None => SyncPlan::Create(sync_fields(remote, fingerprint, true)),
        Some(account) if account.sync_hash == fingerprint => SyncPlan::Unchanged,
        Some(account) => SyncPlan::Update {
            account_id: account.id,
            fields: sync_fields(remote, fingerprint, !account.is_locally_managed()),
        },
    }
}

fn sync_fields(
    remote: &RemoteAccount,
    fingerprint: String,
    overwrite_status: bool,
) -> AccountSyncFields {
    let mapped = remote.mapped_status();
    AccountSyncFields {
        email: remote.name.clone(),
        domain: remote.domain().to_string(),
        display_name: remote.display_name.clone(),
        forwarding_address: remote.preferred_forwarding().to_string(),
        cos_id: remote.cos_id.clone(),
        remote_status: mapped,
        status: overwrite_status.then_some(mapped),
        // Filled in by the engine's best-effort mailbox lookup.
        mailbox_size: None,
        last_login_at: remote.last_logon_at(),
        sync_hash: fingerprint,
    }
}
