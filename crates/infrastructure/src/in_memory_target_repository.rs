use async_trait::async_trait;
use chrono::{NaiveDate, SecondsFormat, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use atrium_application::{
    NewTargetAuditRecord, NewTargetVersion, TargetAuditQuery, TargetAuditRepository,
    TargetRepository,
};
use atrium_core::{AppError, AppResult};
use atrium_domain::{ModalityTarget, TargetAuditRecord, TargetChanges};

/// In-memory target repository implementation.
///
/// Backs tests and local development; the supersession is atomic under
/// one write lock, mirroring the transactional PostgreSQL adapter.
#[derive(Debug, Default)]
pub struct InMemoryTargetRepository {
    rows: RwLock<Vec<ModalityTarget>>,
    records: RwLock<Vec<TargetAuditRecord>>,
}

impl InMemoryTargetRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a target row.
    pub async fn insert_target(&self, target: ModalityTarget) {
        self.rows.write().await.push(target);
    }

    /// Returns every stored version, in insertion order.
    pub async fn all_versions(&self) -> Vec<ModalityTarget> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl TargetRepository for InMemoryTargetRepository {
    async fn find_target(&self, target_id: Uuid) -> AppResult<Option<ModalityTarget>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|row| row.target_id == target_id)
            .cloned())
    }

    async fn update_target_values(
        &self,
        target_id: Uuid,
        changes: &TargetChanges,
    ) -> AppResult<ModalityTarget> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|row| row.target_id == target_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("modality target '{target_id}' was not found"))
            })?;

        row.apply_changes(changes);
        Ok(row.clone())
    }

    async fn supersede_target(
        &self,
        target_id: Uuid,
        truncated_end: NaiveDate,
        successor: NewTargetVersion,
    ) -> AppResult<ModalityTarget> {
        let mut rows = self.rows.write().await;
        let new_id = Uuid::new_v4();

        let old = rows
            .iter_mut()
            .find(|row| row.target_id == target_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("modality target '{target_id}' was not found"))
            })?;

        if !old.is_current {
            return Err(AppError::Conflict(format!(
                "modality target '{target_id}' has already been superseded"
            )));
        }

        old.period_end = truncated_end;
        old.is_current = false;
        old.superseded_by = Some(new_id);
        old.superseded_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

        let new_row = ModalityTarget {
            target_id: new_id,
            principal_id: old.principal_id,
            location_id: old.location_id,
            modality_type_id: old.modality_type_id,
            target_period: old.target_period.clone(),
            period_start: successor.period_start,
            period_end: successor.period_end,
            target_scans: successor.target_scans,
            target_referrals: successor.target_referrals,
            target_revenue: successor.target_revenue,
            version: successor.version,
            is_current: true,
            superseded_by: None,
            superseded_at: None,
        };

        rows.push(new_row.clone());
        Ok(new_row)
    }
}

#[async_trait]
impl TargetAuditRepository for InMemoryTargetRepository {
    async fn append_record(&self, record: NewTargetAuditRecord) -> AppResult<()> {
        self.records.write().await.push(TargetAuditRecord {
            audit_id: Uuid::new_v4(),
            target_id: record.target_id,
            principal_id: record.principal_id,
            action: record.action,
            changed_by: record.changed_by,
            old_values: record.old_values,
            new_values: record.new_values,
            notes: record.notes,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        });
        Ok(())
    }

    async fn list_recent_records(
        &self,
        query: TargetAuditQuery,
    ) -> AppResult<Vec<TargetAuditRecord>> {
        let capped_limit = query.limit.clamp(1, 100);
        Ok(self
            .records
            .read()
            .await
            .iter()
            .rev()
            .filter(|record| {
                query
                    .target_id
                    .is_none_or(|target_id| record.target_id == target_id)
                    && query
                        .principal_id
                        .is_none_or(|principal_id| record.principal_id == principal_id)
            })
            .take(capped_limit)
            .cloned()
            .collect())
    }
}
