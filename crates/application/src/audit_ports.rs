use async_trait::async_trait;

use atrium_core::{AppResult, PrincipalId};
use atrium_domain::AuditAction;

/// Immutable audit event payload emitted by application services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Principal that performed the action.
    pub subject: PrincipalId,
    /// Stable audit action identifier.
    pub action: AuditAction,
    /// Event resource type label.
    pub resource_type: String,
    /// Event resource identifier.
    pub resource_id: String,
    /// Optional audit detail payload.
    pub detail: Option<String>,
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}
