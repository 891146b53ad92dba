//! Typed results parsed off the wire.

use chrono::{DateTime, NaiveDateTime, Utc};
use mailgov_core::{AccountStatus, DirectoryId};

use crate::constants::map_remote_status;

/// How to address an account in a single-entity lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountBy {
    /// By the directory's stable id.
    Id,
    /// By the account's primary email address.
    Name,
}

impl AccountBy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
        }
    }
}

/// One account as the directory reports it.
///
/// Exactly the fields the reconciliation engine consumes; anything else in
/// the response is discarded during parsing, and absent attributes fall back
/// to empty strings rather than failing the record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteAccount {
    /// Stable directory id.
    pub id: DirectoryId,
    /// Primary email address.
    pub name: String,
    /// Display name.
    pub display_name: String,
    /// Raw remote status string (`active`, `locked`, `lockout`, ...).
    pub status: String,
    /// Admin-set forwarding address.
    pub forwarding_address: String,
    /// User-preference forwarding address.
    pub pref_forwarding_address: String,
    /// Mail quota setting, in bytes, as the raw attribute string.
    pub mail_quota: String,
    /// Last logon, in the directory's generalized-time format.
    pub last_logon: String,
    /// Class-of-service id.
    pub cos_id: String,
    /// Mailbox host.
    pub mail_host: String,
}

impl RemoteAccount {
    /// The forwarding address that counts for purge protection: the user
    /// preference wins over the admin-set one.
    #[must_use]
    pub fn preferred_forwarding(&self) -> &str {
        if self.pref_forwarding_address.is_empty() {
            &self.forwarding_address
        } else {
            &self.pref_forwarding_address
        }
    }

    /// Remote status mapped onto the local vocabulary.
    #[must_use]
    pub fn mapped_status(&self) -> AccountStatus {
        map_remote_status(&self.status)
    }

    /// Last logon parsed to UTC, if the directory supplied a usable value.
    #[must_use]
    pub fn last_logon_at(&self) -> Option<DateTime<Utc>> {
        parse_directory_timestamp(&self.last_logon)
    }

    /// Domain part of the email address, empty if malformed.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.name.split_once('@').map_or("", |(_, domain)| domain)
    }
}

/// One page of a directory search.
#[derive(Debug, Clone, Default)]
pub struct AccountPage {
    /// Accounts on this page.
    pub accounts: Vec<RemoteAccount>,
    /// Whether another page exists past this one.
    pub more: bool,
    /// Total matching entries as the directory counted them at this offset.
    pub total: u64,
}

/// Parse the directory's generalized-time format (`20240101120000Z`, with an
/// optional fractional part as in `20240101120000.123Z`).
///
/// Anything unparseable is `None`, never an error: a bad timestamp on one
/// account must not fail its sync.
#[must_use]
pub fn parse_directory_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    let mut clean = raw.split('.').next().unwrap_or("").to_string();
    if !clean.ends_with('Z') {
        clean.push('Z');
    }
    if clean.len() != 15 {
        return None;
    }
    NaiveDateTime::parse_from_str(&clean, "%Y%m%d%H%M%SZ")
        .ok()
        .map(|dt| dt.and_utc())
}
