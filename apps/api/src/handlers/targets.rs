use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use chrono::NaiveDate;
use serde::Deserialize;

use atrium_core::{AppError, UserIdentity};
use atrium_domain::TargetChanges;

use crate::dto::{ModalityTargetResponse, TargetAuditRecordResponse, UpdateTargetRequest};
use crate::error::ApiResult;
use crate::state::AppState;

use super::{parse_principal_id, parse_uuid};

/// Query parameters for the target audit history listing.
#[derive(Debug, Deserialize)]
pub struct AuditHistoryParams {
    pub target_id: Option<String>,
    pub principal_id: Option<String>,
}

pub async fn update_target_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(target_id): Path<String>,
    Json(payload): Json<UpdateTargetRequest>,
) -> ApiResult<Json<ModalityTargetResponse>> {
    let target_id = parse_uuid(&target_id, "target id")?;
    let effective_date = payload
        .effective_date
        .as_deref()
        .map(parse_iso_date)
        .transpose()?;

    let target = state
        .target_service
        .update_target(
            &user,
            target_id,
            effective_date,
            TargetChanges {
                target_scans: payload.target_scans,
                target_referrals: payload.target_referrals,
                target_revenue: payload.target_revenue,
            },
        )
        .await?;

    Ok(Json(ModalityTargetResponse::from(target)))
}

pub async fn target_audit_history_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(params): Query<AuditHistoryParams>,
) -> ApiResult<Json<Vec<TargetAuditRecordResponse>>> {
    let target_id = params
        .target_id
        .as_deref()
        .map(|value| parse_uuid(value, "target id"))
        .transpose()?;
    let principal_id = params
        .principal_id
        .as_deref()
        .map(parse_principal_id)
        .transpose()?;

    let records = state
        .target_service
        .audit_history(&user, target_id, principal_id)
        .await?
        .into_iter()
        .map(TargetAuditRecordResponse::from)
        .collect();

    Ok(Json(records))
}

fn parse_iso_date(value: &str) -> Result<NaiveDate, AppError> {
    value.parse::<NaiveDate>().map_err(|error| {
        AppError::Validation(format!("invalid effective date '{value}': {error}"))
    })
}
