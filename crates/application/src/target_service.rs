use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use atrium_core::{AppError, AppResult, PrincipalId, UserIdentity};
use atrium_domain::{
    AdminCapability, ModalityTarget, TargetAuditAction, TargetAuditRecord, TargetChanges,
    split_period,
};

use crate::{
    AccessService, NewTargetAuditRecord, NewTargetVersion, TargetAuditQuery, TargetAuditRepository,
    TargetRepository,
};

/// Maximum rows returned by target audit history queries.
pub const TARGET_AUDIT_HISTORY_LIMIT: usize = 100;

/// Application service for modality target versioning.
#[derive(Clone)]
pub struct TargetService {
    access_service: AccessService,
    repository: Arc<dyn TargetRepository>,
    audit_repository: Arc<dyn TargetAuditRepository>,
}

impl TargetService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        access_service: AccessService,
        repository: Arc<dyn TargetRepository>,
        audit_repository: Arc<dyn TargetAuditRepository>,
    ) -> Self {
        Self {
            access_service,
            repository,
            audit_repository,
        }
    }

    /// Applies a goal update to a target without destroying history.
    ///
    /// An effective date on or before the current period start mutates
    /// the row in place; a later effective date retires the current
    /// version at the previous day and inserts a successor covering the
    /// rest of the original period. Returns the resulting current row.
    pub async fn update_target(
        &self,
        actor: &UserIdentity,
        target_id: Uuid,
        effective_date: Option<NaiveDate>,
        changes: TargetChanges,
    ) -> AppResult<ModalityTarget> {
        self.access_service
            .require_capability(actor.principal_id(), AdminCapability::ManageTargets)
            .await?;

        changes.validate()?;

        let current = self
            .repository
            .find_target(target_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("modality target '{target_id}' was not found"))
            })?;

        if !current.is_current {
            return Err(AppError::Conflict(format!(
                "modality target '{target_id}' has been superseded and is read-only"
            )));
        }

        let effective_date = effective_date.unwrap_or_else(|| Utc::now().date_naive());
        let old_values = current.values_snapshot();

        // No history to protect when the change applies from the start.
        if effective_date <= current.period_start {
            let updated = self
                .repository
                .update_target_values(target_id, &changes)
                .await?;

            self.append_audit(NewTargetAuditRecord {
                target_id,
                principal_id: current.principal_id,
                action: TargetAuditAction::Updated,
                changed_by: actor.principal_id(),
                old_values,
                new_values: updated.values_snapshot(),
                notes: None,
            })
            .await;

            return Ok(updated);
        }

        let split = split_period(current.period_start, current.period_end, effective_date)?;

        let mut successor_values = current.clone();
        successor_values.apply_changes(&changes);

        let new_current = self
            .repository
            .supersede_target(
                target_id,
                split.truncated_end,
                NewTargetVersion {
                    period_start: split.successor_start,
                    period_end: split.successor_end,
                    target_scans: successor_values.target_scans,
                    target_referrals: successor_values.target_referrals,
                    target_revenue: successor_values.target_revenue,
                    version: current.version + 1,
                },
            )
            .await?;

        self.append_audit(NewTargetAuditRecord {
            target_id,
            principal_id: current.principal_id,
            action: TargetAuditAction::Superseded,
            changed_by: actor.principal_id(),
            old_values,
            new_values: new_current.values_snapshot(),
            notes: Some(format!(
                "Split at {}: version {} now ends {}; version {} covers {} to {}",
                effective_date,
                current.version,
                split.truncated_end,
                new_current.version,
                split.successor_start,
                split.successor_end
            )),
        })
        .await;

        Ok(new_current)
    }

    /// Returns the most recent audit records, newest first.
    pub async fn audit_history(
        &self,
        actor: &UserIdentity,
        target_id: Option<Uuid>,
        principal_id: Option<PrincipalId>,
    ) -> AppResult<Vec<TargetAuditRecord>> {
        self.access_service
            .require_capability(actor.principal_id(), AdminCapability::ViewTargetAudit)
            .await?;

        self.audit_repository
            .list_recent_records(TargetAuditQuery {
                target_id,
                principal_id,
                limit: TARGET_AUDIT_HISTORY_LIMIT,
            })
            .await
    }

    // The mutation is considered more important than its audit trail;
    // append failures are surfaced in logs only.
    async fn append_audit(&self, record: NewTargetAuditRecord) {
        let target_id = record.target_id;
        if let Err(error) = self.audit_repository.append_record(record).await {
            tracing::warn!(%target_id, %error, "failed to append target audit record");
        }
    }
}
