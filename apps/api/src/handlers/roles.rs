use axum::Json;
use axum::extract::{Extension, Path, State};
use edsetu_application::PermissionBindingService;
use edsetu_core::UserIdentity;
use edsetu_domain::RoleType;

use crate::dto::{
    PermissionResponse, PermissionToggleRequest, RolePermissionsResponse, RoleResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    state.authorization_service.require_member(&user).await?;

    let roles = state
        .role_registry_service
        .list_roles(user.organization_id())
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn get_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role): Path<String>,
) -> ApiResult<Json<RoleResponse>> {
    state.authorization_service.require_member(&user).await?;

    let role = state
        .role_registry_service
        .get_role(user.organization_id(), role.as_str())
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn role_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role): Path<String>,
) -> ApiResult<Json<RolePermissionsResponse>> {
    let permissions = state
        .permission_binding_service
        .permissions_for_role(&user, role.as_str())
        .await?;

    Ok(Json(RolePermissionsResponse::new(
        RoleType::from_transport(role.as_str())?,
        permissions,
    )))
}

pub async fn set_role_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role): Path<String>,
    Json(payload): Json<PermissionToggleRequest>,
) -> ApiResult<Json<RolePermissionsResponse>> {
    let permissions = state
        .permission_binding_service
        .set_role_permission(
            &user,
            role.as_str(),
            payload.permission.as_str(),
            payload.enabled,
        )
        .await?;

    Ok(Json(RolePermissionsResponse::new(
        RoleType::from_transport(role.as_str())?,
        permissions,
    )))
}

pub async fn list_permissions_handler() -> Json<Vec<PermissionResponse>> {
    Json(
        PermissionBindingService::list_permissions()
            .into_iter()
            .map(PermissionResponse::from)
            .collect(),
    )
}
