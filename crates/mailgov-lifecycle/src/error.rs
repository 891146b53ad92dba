//! Lifecycle errors.

use thiserror::Error;

use mailgov_core::StoreError;

/// Infrastructure failure during a lifecycle operation.
///
/// Business-rule rejections are not errors (they are `TransitionOutcome`
/// values), and directory failures abort only the operation they occur in.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The local store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;
