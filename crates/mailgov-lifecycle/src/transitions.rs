//! The transition table.
//!
//! Pure rules, no I/O. `purged` is terminal: nothing leaves it.

use mailgov_core::AccountStatus;

/// Allowed targets from a given status.
#[must_use]
pub fn allowed_targets(from: AccountStatus) -> &'static [AccountStatus] {
    match from {
        AccountStatus::Active => &[AccountStatus::Locked, AccountStatus::Closed],
        AccountStatus::Locked => &[AccountStatus::Active, AccountStatus::Closed],
        AccountStatus::Closed => &[AccountStatus::Active],
        AccountStatus::PendingPurge => &[AccountStatus::Active],
        AccountStatus::Purged => &[],
    }
}

/// Validate one transition, returning the rejection message on failure.
pub fn check_transition(from: AccountStatus, to: AccountStatus) -> Result<(), String> {
    if to == from {
        return Err(format!("account is already {from}"));
    }
    if from == AccountStatus::Purged {
        return Err("cannot change status of a purged account".to_string());
    }
    let targets = allowed_targets(from);
    if !targets.contains(&to) {
        let valid = targets
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(format!(
            "cannot transition from {from} to {to}; valid targets: {valid}"
        ));
    }
    Ok(())
}
