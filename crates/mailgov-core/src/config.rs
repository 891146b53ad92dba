//! Application configuration loaded from environment variables.
//!
//! Fail-fast: required variables must be present and valid or loading returns
//! an error naming the offending variable.

use thiserror::Error;

/// Configuration loading error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// A variable is present but cannot be parsed.
    #[error("invalid value for {var}: {message}")]
    Invalid {
        var: &'static str,
        message: String,
    },
}

/// Connection settings for the remote directory.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Admin service endpoint, e.g. `https://mail.example.com:7071/service/admin/soap`.
    pub url: String,
    /// Admin account used for authentication.
    pub admin_user: String,
    /// Admin password.
    pub admin_password: String,
    /// Request timeout ceiling in seconds.
    pub timeout_secs: u64,
}

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres connection string.
    pub database_url: String,
    /// Remote directory connection settings.
    pub directory: DirectoryConfig,
    /// Page size for directory listing during reconciliation.
    pub sync_page_size: u32,
    /// Days between an account closing and its purge eligibility.
    pub purge_delay_days: u32,
}

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SYNC_PAGE_SIZE: u32 = 500;
const DEFAULT_PURGE_DELAY_DAYS: u32 = 60;

impl AppConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let database_url = require(&lookup, "MAILGOV_DATABASE_URL")?;
        let url = require(&lookup, "MAILGOV_DIRECTORY_URL")?;
        let admin_user = require(&lookup, "MAILGOV_DIRECTORY_ADMIN_USER")?;
        let admin_password = require(&lookup, "MAILGOV_DIRECTORY_ADMIN_PASSWORD")?;

        let timeout_secs = parse_or(&lookup, "MAILGOV_REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let sync_page_size = parse_or(&lookup, "MAILGOV_SYNC_PAGE_SIZE", DEFAULT_SYNC_PAGE_SIZE)?;
        let purge_delay_days =
            parse_or(&lookup, "MAILGOV_PURGE_DELAY_DAYS", DEFAULT_PURGE_DELAY_DAYS)?;

        if sync_page_size == 0 {
            return Err(ConfigError::Invalid {
                var: "MAILGOV_SYNC_PAGE_SIZE",
                message: "page size must be at least 1".to_string(),
            });
        }

        Ok(Self {
            database_url,
            directory: DirectoryConfig {
                url,
                admin_user,
                admin_password,
                timeout_secs,
            },
            sync_page_size,
            purge_delay_days,
        })
    }
}

fn require<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(var) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(var)),
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, String> {
        HashMap::from([
            ("MAILGOV_DATABASE_URL", "postgres://mailgov@localhost/mailgov".to_string()),
            (
                "MAILGOV_DIRECTORY_URL",
                "https://mail.example.com:7071/service/admin/soap".to_string(),
            ),
            ("MAILGOV_DIRECTORY_ADMIN_USER", "admin@example.com".to_string()),
            ("MAILGOV_DIRECTORY_ADMIN_PASSWORD", "hunter2".to_string()),
        ])
    }

    fn load(vars: HashMap<&'static str, String>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn loads_with_defaults() {
        let config = load(base_vars()).unwrap();
        assert_eq!(config.directory.timeout_secs, 60);
        assert_eq!(config.sync_page_size, 500);
        assert_eq!(config.purge_delay_days, 60);
    }

    #[test]
    fn missing_required_variable_fails() {
        let mut vars = base_vars();
        vars.remove("MAILGOV_DIRECTORY_URL");
        let err = load(vars).unwrap_err();
        assert!(err.to_string().contains("MAILGOV_DIRECTORY_URL"));
    }

    #[test]
    fn blank_required_variable_fails() {
        let mut vars = base_vars();
        vars.insert("MAILGOV_DIRECTORY_ADMIN_PASSWORD", "  ".to_string());
        assert!(load(vars).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let mut vars = base_vars();
        vars.insert("MAILGOV_SYNC_PAGE_SIZE", "100".to_string());
        vars.insert("MAILGOV_PURGE_DELAY_DAYS", "30".to_string());
        let config = load(vars).unwrap();
        assert_eq!(config.sync_page_size, 100);
        assert_eq!(config.purge_delay_days, 30);
    }

    #[test]
    fn malformed_override_fails() {
        let mut vars = base_vars();
        vars.insert("MAILGOV_SYNC_PAGE_SIZE", "lots".to_string());
        assert!(load(vars).is_err());
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let mut vars = base_vars();
        vars.insert("MAILGOV_SYNC_PAGE_SIZE", "0".to_string());
        assert!(load(vars).is_err());
    }
}
