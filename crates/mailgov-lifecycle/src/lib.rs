//! Account lifecycle
//!
//! The status state machine (lock / close / reactivate with full rule
//! enforcement), the purge processor that executes deferred deletions, and
//! bulk operations over account lists.
//!
//! Business-rule rejections (an off-table transition, a no-op request, any
//! operation on a purged account) are ordinary [`TransitionOutcome`] values,
//! never errors. Only infrastructure failures (the local store) propagate as
//! [`LifecycleError`]; remote directory failures abort the one operation they
//! occur in and are reported in its outcome.

pub mod bulk;
pub mod error;
pub mod purge;
pub mod service;
pub mod store;
pub mod transitions;

pub use bulk::{BulkItemResult, BulkOperationKind, BulkReport};
pub use error::{LifecycleError, LifecycleResult};
pub use purge::{PurgeDetail, PurgeProcessor, PurgeResults};
pub use service::{LifecycleConfig, LifecycleService, TransitionOutcome};
pub use store::{CloseEffects, LifecycleStore, PgLifecycleStore, TransitionRecord};
pub use transitions::{allowed_targets, check_transition};
