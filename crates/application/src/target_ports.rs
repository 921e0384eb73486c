use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use uuid::Uuid;

use atrium_core::{AppResult, PrincipalId};
use atrium_domain::{ModalityTarget, TargetAuditAction, TargetAuditRecord, TargetChanges};

/// Field values for the successor row inserted during supersession.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTargetVersion {
    /// First day of the successor version (the effective date).
    pub period_start: NaiveDate,
    /// Last day of the successor version (the original period end).
    pub period_end: NaiveDate,
    /// Goal for completed scans.
    pub target_scans: i64,
    /// Goal for inbound referrals.
    pub target_referrals: i64,
    /// Goal for generated revenue.
    pub target_revenue: f64,
    /// Version ordinal, one above the superseded row.
    pub version: i32,
}

/// Repository port for modality target persistence.
#[async_trait]
pub trait TargetRepository: Send + Sync {
    /// Finds one target row by identifier.
    async fn find_target(&self, target_id: Uuid) -> AppResult<Option<ModalityTarget>>;

    /// Mutates the goal values of an existing row in place.
    async fn update_target_values(
        &self,
        target_id: Uuid,
        changes: &TargetChanges,
    ) -> AppResult<ModalityTarget>;

    /// Retires the current row and inserts its successor as one atomic
    /// operation.
    ///
    /// The superseded row keeps its identity with `period_end` set to
    /// `truncated_end`, `is_current` cleared, `superseded_at` stamped,
    /// and `superseded_by` back-linked to the inserted row. Returns the
    /// new current row.
    async fn supersede_target(
        &self,
        target_id: Uuid,
        truncated_end: NaiveDate,
        successor: NewTargetVersion,
    ) -> AppResult<ModalityTarget>;
}

/// New entry for the append-only target audit trail.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTargetAuditRecord {
    /// Target row the mutation applied to.
    pub target_id: Uuid,
    /// Owner of the target, denormalized for history filtering.
    pub principal_id: PrincipalId,
    /// Mutation kind.
    pub action: TargetAuditAction,
    /// Administrator who performed the mutation.
    pub changed_by: PrincipalId,
    /// Versioned fields before the mutation.
    pub old_values: Value,
    /// Versioned fields after the mutation.
    pub new_values: Value,
    /// Optional human-readable note.
    pub notes: Option<String>,
}

/// Query parameters for target audit history listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetAuditQuery {
    /// Optional target row filter.
    pub target_id: Option<Uuid>,
    /// Optional target owner filter.
    pub principal_id: Option<PrincipalId>,
    /// Maximum rows returned.
    pub limit: usize,
}

/// Port for the append-only target audit trail.
#[async_trait]
pub trait TargetAuditRepository: Send + Sync {
    /// Persists one audit record.
    async fn append_record(&self, record: NewTargetAuditRecord) -> AppResult<()>;

    /// Lists matching records, newest first.
    async fn list_recent_records(
        &self,
        query: TargetAuditQuery,
    ) -> AppResult<Vec<TargetAuditRecord>>;
}
