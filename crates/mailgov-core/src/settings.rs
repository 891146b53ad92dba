//! Settings store collaborator.
//!
//! Durable settings persistence is out of scope; the core reads and writes
//! string-typed settings through this trait.

use async_trait::async_trait;

use crate::error::StoreResult;

/// Key for the automatic sync interval, in whole hours. `"0"` disables the
/// scheduled job.
pub const SETTING_SYNC_INTERVAL_HOURS: &str = "sync_interval_hours";

/// String-typed key/value settings store.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Fetch a setting, returning `default` when the key is absent.
    async fn get(&self, key: &str, default: &str) -> StoreResult<String>;

    /// Upsert a setting.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;
}

/// Parse a stored sync interval. Absent or malformed values mean "disabled".
#[must_use]
pub fn parse_sync_interval_hours(raw: &str) -> u32 {
    raw.trim().parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_parses_valid_values() {
        assert_eq!(parse_sync_interval_hours("0"), 0);
        assert_eq!(parse_sync_interval_hours("4"), 4);
        assert_eq!(parse_sync_interval_hours(" 24 "), 24);
    }

    #[test]
    fn malformed_interval_disables() {
        assert_eq!(parse_sync_interval_hours(""), 0);
        assert_eq!(parse_sync_interval_hours("often"), 0);
        assert_eq!(parse_sync_interval_hours("-1"), 0);
    }
}
