use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;

use atrium_core::{AppError, UserIdentity};
use atrium_domain::{OverrideChange, PermissionEffect};

use crate::dto::{EffectivePermissionResponse, SaveOverridesRequest};
use crate::error::ApiResult;
use crate::state::AppState;

use super::{parse_principal_id, parse_uuid};

pub async fn effective_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(principal_id): Path<String>,
) -> ApiResult<Json<Vec<EffectivePermissionResponse>>> {
    let principal_id = parse_principal_id(&principal_id)?;

    let permissions = state
        .access_service
        .effective_permissions(&user, principal_id)
        .await?
        .into_iter()
        .map(EffectivePermissionResponse::from)
        .collect();

    Ok(Json(permissions))
}

pub async fn save_overrides_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(principal_id): Path<String>,
    Json(payload): Json<SaveOverridesRequest>,
) -> ApiResult<StatusCode> {
    let principal_id = parse_principal_id(&principal_id)?;

    let changes = payload
        .changes
        .into_iter()
        .map(|change| {
            Ok(OverrideChange {
                permission_id: parse_uuid(&change.permission_id, "permission id")?,
                effect: change
                    .effect
                    .as_deref()
                    .map(PermissionEffect::from_transport)
                    .transpose()?,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    state
        .access_service
        .commit_override_changes(&user, principal_id, changes)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
