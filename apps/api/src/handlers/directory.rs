use axum::Json;
use axum::extract::{Extension, State};

use atrium_core::UserIdentity;

use crate::dto::DirectoryMemberResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_directory_members_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<DirectoryMemberResponse>>> {
    let members = state
        .directory_service
        .list_members(&user)
        .await?
        .into_iter()
        .map(DirectoryMemberResponse::from)
        .collect();

    Ok(Json(members))
}
