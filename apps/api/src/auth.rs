use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tower_sessions::Session;

use atrium_core::{AppError, UserIdentity};

use crate::dto::{LoginRequest, UserIdentityResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Session key holding the authenticated identity.
pub const SESSION_USER_KEY: &str = "user_identity";

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = state
        .identity_service
        .authenticate(&payload.email, &payload.password)
        .await?;

    // OWASP Session Management: regenerate session ID on privilege change.
    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, identity.clone())
        .await
        .map_err(|error| AppError::Internal(format!("failed to store session identity: {error}")))?;

    Ok(Json(UserIdentityResponse::from(identity)))
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(session: Session) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    Ok(Json(UserIdentityResponse::from(identity)))
}
