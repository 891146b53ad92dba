//! Database-layer errors.

use thiserror::Error;

/// Error establishing or migrating the database.
#[derive(Debug, Error)]
pub enum DbError {
    /// Failed to connect to Postgres.
    #[error("failed to connect to database: {0}")]
    Connection(#[source] sqlx::Error),

    /// A migration failed to apply.
    #[error("migration failed: {0}")]
    MigrationFailed(#[source] sqlx::migrate::MigrateError),
}
