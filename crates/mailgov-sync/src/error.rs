//! Sync errors.

use thiserror::Error;

use mailgov_core::StoreError;
use mailgov_directory::DirectoryError;

/// Fatal error aborting a reconciliation run.
///
/// Per-account failures are not errors at this level; the engine counts and
/// records them in the run summary. Only pagination failures and store
/// bookkeeping failures surface here.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The directory listing itself failed; partial listings cannot be
    /// trusted for change detection, so the run aborts.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// The local store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
