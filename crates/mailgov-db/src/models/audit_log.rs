//! Audit log storage. Querying and display live in the (out of scope) UI;
//! this model only appends.

use chrono::{DateTime, Utc};
use mailgov_core::AuditEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// One recorded audit event.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditLog {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub details: JsonValue,
    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    /// Append one event.
    pub async fn record(pool: &PgPool, event: &AuditEvent) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO audit_log (actor_id, action, target_type, target_id, details)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            ",
        )
        .bind(event.actor.map(|a| a.as_uuid()))
        .bind(event.action.to_string())
        .bind(&event.target_type)
        .bind(&event.target_id)
        .bind(&event.details)
        .fetch_one(pool)
        .await
    }
}
