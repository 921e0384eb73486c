use serde::{Deserialize, Serialize};
use ts_rs::TS;

use atrium_domain::{ModalityTarget, TargetAuditRecord};

/// Incoming payload for a modality target update.
///
/// `effective_date` is an ISO `YYYY-MM-DD` day and defaults to today.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-target-request.ts"
)]
pub struct UpdateTargetRequest {
    pub effective_date: Option<String>,
    pub target_scans: Option<i64>,
    pub target_referrals: Option<i64>,
    pub target_revenue: Option<f64>,
}

/// API representation of one modality target version.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/modality-target-response.ts"
)]
pub struct ModalityTargetResponse {
    pub target_id: String,
    pub principal_id: String,
    pub location_id: String,
    pub modality_type_id: String,
    pub target_period: String,
    pub period_start: String,
    pub period_end: String,
    pub target_scans: i64,
    pub target_referrals: i64,
    pub target_revenue: f64,
    pub version: i32,
    pub is_current: bool,
    pub superseded_by: Option<String>,
    pub superseded_at: Option<String>,
}

/// API representation of one target audit record.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/target-audit-record-response.ts"
)]
pub struct TargetAuditRecordResponse {
    pub audit_id: String,
    pub target_id: String,
    pub principal_id: String,
    pub action: String,
    pub changed_by: String,
    #[ts(type = "Record<string, unknown>")]
    pub old_values: serde_json::Value,
    #[ts(type = "Record<string, unknown>")]
    pub new_values: serde_json::Value,
    pub notes: Option<String>,
    pub created_at: String,
}

impl From<ModalityTarget> for ModalityTargetResponse {
    fn from(value: ModalityTarget) -> Self {
        Self {
            target_id: value.target_id.to_string(),
            principal_id: value.principal_id.to_string(),
            location_id: value.location_id.to_string(),
            modality_type_id: value.modality_type_id.to_string(),
            target_period: value.target_period,
            period_start: value.period_start.to_string(),
            period_end: value.period_end.to_string(),
            target_scans: value.target_scans,
            target_referrals: value.target_referrals,
            target_revenue: value.target_revenue,
            version: value.version,
            is_current: value.is_current,
            superseded_by: value.superseded_by.map(|id| id.to_string()),
            superseded_at: value.superseded_at,
        }
    }
}

impl From<TargetAuditRecord> for TargetAuditRecordResponse {
    fn from(value: TargetAuditRecord) -> Self {
        Self {
            audit_id: value.audit_id.to_string(),
            target_id: value.target_id.to_string(),
            principal_id: value.principal_id.to_string(),
            action: value.action.as_str().to_owned(),
            changed_by: value.changed_by.to_string(),
            old_values: value.old_values,
            new_values: value.new_values,
            notes: value.notes,
            created_at: value.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use atrium_core::PrincipalId;
    use atrium_domain::ModalityTarget;

    use super::ModalityTargetResponse;

    #[test]
    fn target_dates_serialize_as_iso_days() {
        let target = ModalityTarget {
            target_id: Uuid::new_v4(),
            principal_id: PrincipalId::new(),
            location_id: Uuid::new_v4(),
            modality_type_id: Uuid::new_v4(),
            target_period: "2025".to_owned(),
            period_start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            period_end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap_or_default(),
            target_scans: 100,
            target_referrals: 40,
            target_revenue: 250_000.0,
            version: 1,
            is_current: true,
            superseded_by: None,
            superseded_at: None,
        };

        let response = ModalityTargetResponse::from(target);

        assert_eq!(response.period_start, "2025-01-01");
        assert_eq!(response.period_end, "2025-12-31");
    }
}
