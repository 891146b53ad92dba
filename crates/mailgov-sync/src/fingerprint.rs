//! Change-detection fingerprint.
//!
//! SHA-256 over a fixed, ordered field tuple joined with a fixed separator.
//! The field order and separator are part of the contract: changing either
//! invalidates every stored fingerprint and forces a full re-sync of all
//! accounts on the next run.

use sha2::{Digest, Sha256};

use mailgov_directory::RemoteAccount;

/// Separator between fingerprint fields.
pub const FINGERPRINT_SEPARATOR: &str = "|";

/// Compute the fingerprint of a remote account's synced field set.
///
/// Fields, in contract order: email name, display name, raw remote status,
/// admin forwarding address, preference forwarding address, mail quota, last
/// logon timestamp. All raw wire strings, deliberately unnormalized so any
/// remote edit is visible.
#[must_use]
pub fn compute_fingerprint(account: &RemoteAccount) -> String {
    let joined = [
        account.name.as_str(),
        account.display_name.as_str(),
        account.status.as_str(),
        account.forwarding_address.as_str(),
        account.pref_forwarding_address.as_str(),
        account.mail_quota.as_str(),
        account.last_logon.as_str(),
    ]
    .join(FINGERPRINT_SEPARATOR);

    hex::encode(Sha256::digest(joined.as_bytes()))
}
