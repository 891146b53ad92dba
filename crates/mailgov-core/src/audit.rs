//! Audit sink collaborator.
//!
//! Audit storage and querying live outside the core; the core only emits
//! events through this trait. One event per user-visible operation: a status
//! change, a purge execution, a finished sync run, a bulk operation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::error::StoreResult;
use crate::ids::ActorId;

/// Audited action kinds emitted by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// An account lifecycle transition.
    StatusChange,
    /// A bulk lifecycle operation over a list of accounts.
    BulkOp,
    /// A completed reconciliation run.
    Sync,
    /// An executed purge.
    Purge,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StatusChange => write!(f, "status_change"),
            Self::BulkOp => write!(f, "bulk_op"),
            Self::Sync => write!(f, "sync"),
            Self::Purge => write!(f, "purge"),
        }
    }
}

/// One audit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// What happened.
    pub action: AuditAction,
    /// Operator who triggered it; `None` means the system itself.
    pub actor: Option<ActorId>,
    /// Kind of record the event targets ("account", "sync", ...).
    pub target_type: String,
    /// Identifier of the targeted record.
    pub target_id: String,
    /// Free-form structured detail payload.
    pub details: JsonValue,
}

impl AuditEvent {
    /// Create an event with an empty detail payload.
    pub fn new(
        action: AuditAction,
        target_type: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            action,
            actor: None,
            target_type: target_type.into(),
            target_id: target_id.into(),
            details: JsonValue::Object(serde_json::Map::new()),
        }
    }

    /// Attribute the event to an operator.
    #[must_use]
    pub fn by(mut self, actor: Option<ActorId>) -> Self {
        self.actor = actor;
        self
    }

    /// Attach the structured detail payload.
    #[must_use]
    pub fn with_details(mut self, details: JsonValue) -> Self {
        self.details = details;
        self
    }
}

/// Sink the core writes audit events into.
///
/// Implemented over the audit-log table by `mailgov-db`; the trait exists so
/// engine and lifecycle tests can capture events in memory.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record one event. Failures are the implementor's to report; callers
    /// treat the sink as best-effort and never roll back on audit failure.
    async fn record(&self, event: AuditEvent) -> StoreResult<()>;
}
