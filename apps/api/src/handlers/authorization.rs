use axum::Json;
use axum::extract::{Extension, Query, State};
use edsetu_application::AuthorizationService;
use edsetu_core::UserIdentity;
use edsetu_domain::{Permission, RoleType};
use serde::Deserialize;

use crate::dto::{CanManageResponse, PermissionCheckResponse};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PermissionCheckQuery {
    pub permission: String,
}

#[derive(Debug, Deserialize)]
pub struct CanManageQuery {
    pub target_role: String,
}

pub async fn check_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<PermissionCheckQuery>,
) -> ApiResult<Json<PermissionCheckResponse>> {
    let permission = Permission::from_transport(query.permission.as_str())?;
    let allowed = state
        .authorization_service
        .can(user.organization_id(), user.subject(), permission)
        .await?;

    Ok(Json(PermissionCheckResponse {
        permission: permission.as_str().to_owned(),
        allowed,
    }))
}

pub async fn can_manage_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<CanManageQuery>,
) -> ApiResult<Json<CanManageResponse>> {
    let target_role = RoleType::from_transport(query.target_role.as_str())?;
    let actor_role = state.authorization_service.require_member(&user).await?;

    Ok(Json(CanManageResponse {
        actor_role: actor_role.as_str().to_owned(),
        target_role: target_role.as_str().to_owned(),
        allowed: AuthorizationService::can_manage(actor_role, target_role),
    }))
}
