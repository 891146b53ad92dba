//! Wire-protocol constants and status vocabulary mapping.

use mailgov_core::AccountStatus;

/// SOAP 1.2 envelope namespace.
pub const SOAP_ENV_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

/// Admin operation namespace.
pub const ADMIN_NS: &str = "urn:zimbraAdmin";

/// Context/fault-detail namespace.
pub const SOAP_NS: &str = "urn:zimbra";

// Account attribute names. These plus the entry name are the complete set
// pulled from the directory; the first seven feed the sync fingerprint.
pub const A_DISPLAY_NAME: &str = "displayName";
pub const A_ACCOUNT_STATUS: &str = "zimbraAccountStatus";
pub const A_FORWARDING: &str = "zimbraMailForwardingAddress";
pub const A_PREF_FORWARDING: &str = "zimbraPrefMailForwardingAddress";
pub const A_MAIL_QUOTA: &str = "zimbraMailQuota";
pub const A_LAST_LOGON: &str = "zimbraLastLogonTimestamp";
pub const A_COS_ID: &str = "zimbraCOSId";
pub const A_MAIL_HOST: &str = "zimbraMailHost";
pub const A_MAIL: &str = "mail";

/// Attributes requested on every directory search.
pub const ACCOUNT_ATTRS: [&str; 9] = [
    A_ACCOUNT_STATUS,
    A_DISPLAY_NAME,
    A_FORWARDING,
    A_PREF_FORWARDING,
    A_MAIL_QUOTA,
    A_LAST_LOGON,
    A_COS_ID,
    A_MAIL_HOST,
    A_MAIL,
];

/// Fault message sentinel distinguishing "entity absent" from other faults.
pub const NOT_FOUND_SENTINEL: &str = "no such account";

/// Fault detail code for the same condition.
pub const CODE_NO_SUCH_ACCOUNT: &str = "account.NO_SUCH_ACCOUNT";

/// Remote status value a local status pushes as, if any.
///
/// Only `active`, `locked`, and `closed` exist remotely; `pending_purge` and
/// `purged` are local bookkeeping and push nothing.
#[must_use]
pub fn remote_status_for(status: AccountStatus) -> Option<&'static str> {
    match status {
        AccountStatus::Active => Some("active"),
        AccountStatus::Locked => Some("locked"),
        AccountStatus::Closed => Some("closed"),
        AccountStatus::PendingPurge | AccountStatus::Purged => None,
    }
}

/// Map a raw remote status onto the local vocabulary.
///
/// `lockout` and `maintenance` are remote-only states that read as locked
/// here; anything unrecognized defaults to active.
#[must_use]
pub fn map_remote_status(raw: &str) -> AccountStatus {
    match raw {
        "locked" | "lockout" | "maintenance" => AccountStatus::Locked,
        "closed" => AccountStatus::Closed,
        _ => AccountStatus::Active,
    }
}
