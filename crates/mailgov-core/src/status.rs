//! Status vocabularies for accounts, purge-queue entries, and sync runs.
//!
//! Stored as `varchar` columns; the row structs keep the raw string and parse
//! through these enums on access.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Locally governed lifecycle status of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Mailbox is usable.
    Active,
    /// Login disabled; mail still delivered.
    Locked,
    /// Account closed and counting down toward purge eligibility.
    Closed,
    /// Queued for deletion.
    PendingPurge,
    /// Deleted from the directory. Terminal.
    Purged,
}

impl AccountStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [AccountStatus; 5] = [
        Self::Active,
        Self::Locked,
        Self::Closed,
        Self::PendingPurge,
        Self::Purged,
    ];

    /// Whether any further transition is permitted.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Purged)
    }

    /// Whether an account in this status may still be purged.
    #[must_use]
    pub fn is_purgeable(&self) -> bool {
        matches!(self, Self::Closed | Self::PendingPurge)
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Locked => write!(f, "locked"),
            Self::Closed => write!(f, "closed"),
            Self::PendingPurge => write!(f, "pending_purge"),
            Self::Purged => write!(f, "purged"),
        }
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "locked" => Ok(Self::Locked),
            "closed" => Ok(Self::Closed),
            "pending_purge" => Ok(Self::PendingPurge),
            "purged" => Ok(Self::Purged),
            other => Err(format!("unknown account status: {other}")),
        }
    }
}

/// Status of one scheduled-deletion intent in the purge queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgeEntryStatus {
    /// Waiting for its eligibility date.
    Waiting,
    /// Approved by an operator; still waiting for its eligibility date.
    Approved,
    /// Deletion executed.
    Executed,
    /// Cancelled (account reactivated before execution).
    Cancelled,
    /// Skipped at execution time (protected account).
    Skipped,
}

impl PurgeEntryStatus {
    /// Whether the entry still represents a live deletion intent.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Waiting | Self::Approved)
    }
}

impl fmt::Display for PurgeEntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Approved => write!(f, "approved"),
            Self::Executed => write!(f, "executed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

impl std::str::FromStr for PurgeEntryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(Self::Waiting),
            "approved" => Ok(Self::Approved),
            "executed" => Ok(Self::Executed),
            "cancelled" => Ok(Self::Cancelled),
            "skipped" => Ok(Self::Skipped),
            other => Err(format!("unknown purge entry status: {other}")),
        }
    }
}

/// Outcome of a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunStatus {
    /// Run in progress.
    Running,
    /// Run finished; counts are final.
    Completed,
    /// Run aborted; counts must not be trusted.
    Failed,
}

impl SyncRunStatus {
    /// Whether the run has ended and its record is immutable.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for SyncRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for SyncRunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown sync run status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_status_round_trips() {
        for status in AccountStatus::ALL {
            let parsed: AccountStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn purged_is_terminal() {
        assert!(AccountStatus::Purged.is_terminal());
        for status in [
            AccountStatus::Active,
            AccountStatus::Locked,
            AccountStatus::Closed,
            AccountStatus::PendingPurge,
        ] {
            assert!(!status.is_terminal());
        }
    }

    #[test]
    fn purgeable_statuses() {
        assert!(AccountStatus::Closed.is_purgeable());
        assert!(AccountStatus::PendingPurge.is_purgeable());
        assert!(!AccountStatus::Active.is_purgeable());
        assert!(!AccountStatus::Locked.is_purgeable());
        assert!(!AccountStatus::Purged.is_purgeable());
    }

    #[test]
    fn open_purge_entries() {
        assert!(PurgeEntryStatus::Waiting.is_open());
        assert!(PurgeEntryStatus::Approved.is_open());
        assert!(!PurgeEntryStatus::Executed.is_open());
        assert!(!PurgeEntryStatus::Cancelled.is_open());
        assert!(!PurgeEntryStatus::Skipped.is_open());
    }

    #[test]
    fn sync_run_terminal_statuses() {
        assert!(!SyncRunStatus::Running.is_terminal());
        assert!(SyncRunStatus::Completed.is_terminal());
        assert!(SyncRunStatus::Failed.is_terminal());
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("suspended".parse::<AccountStatus>().is_err());
        assert!("pending".parse::<PurgeEntryStatus>().is_err());
    }
}
