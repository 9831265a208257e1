use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use edsetu_application::{AssignRoleInput, AssignmentQuery, PermissionToggle};
use edsetu_core::UserIdentity;
use edsetu_domain::{Permission, RoleType};
use serde::Deserialize;

use crate::dto::{
    AssignRoleRequest, PermissionToggleRequest, PermissionToggleResponse, RoleAssignmentResponse,
    UserPermissionsResponse, permission_names,
};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RoleAssignmentListQuery {
    pub role: Option<String>,
}

pub async fn user_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<RoleAssignmentResponse>> {
    let assignment = state
        .role_assignment_service
        .visible_assignment(&user, user_id.as_str())
        .await?;

    Ok(Json(RoleAssignmentResponse::from(assignment)))
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
    Json(payload): Json<AssignRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleAssignmentResponse>)> {
    let permission_overrides = payload
        .permission_overrides
        .iter()
        .map(|toggle| {
            Permission::from_transport(toggle.permission.as_str()).map(|permission| {
                PermissionToggle {
                    permission,
                    enabled: toggle.enabled,
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let assignment = state
        .role_assignment_service
        .assign_role(
            &user,
            AssignRoleInput {
                user_id,
                role_name: payload.role_name,
                permission_overrides,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RoleAssignmentResponse::from(assignment)),
    ))
}

pub async fn revoke_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .role_assignment_service
        .revoke_role(&user, user_id.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn user_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserPermissionsResponse>> {
    let permissions = state
        .permission_binding_service
        .effective_permissions_for_user(&user, user_id.as_str())
        .await?;

    user_permissions_response(&state, &user, user_id, permissions).await
}

pub async fn set_user_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
    Json(payload): Json<PermissionToggleRequest>,
) -> ApiResult<Json<UserPermissionsResponse>> {
    let permissions = state
        .permission_binding_service
        .set_user_permission(
            &user,
            user_id.as_str(),
            payload.permission.as_str(),
            payload.enabled,
        )
        .await?;

    user_permissions_response(&state, &user, user_id, permissions).await
}

pub async fn list_role_assignments_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<RoleAssignmentListQuery>,
) -> ApiResult<Json<Vec<RoleAssignmentResponse>>> {
    let role = query
        .role
        .as_deref()
        .map(RoleType::from_transport)
        .transpose()?;

    let assignments = state
        .role_assignment_service
        .list_assignments(&user, AssignmentQuery { role })
        .await?
        .into_iter()
        .map(RoleAssignmentResponse::from)
        .collect();

    Ok(Json(assignments))
}

async fn user_permissions_response(
    state: &AppState,
    user: &UserIdentity,
    user_id: String,
    permissions: Vec<Permission>,
) -> ApiResult<Json<UserPermissionsResponse>> {
    let overrides = state
        .permission_binding_service
        .user_overrides(user, user_id.as_str())
        .await?
        .into_iter()
        .map(|toggle| PermissionToggleResponse {
            permission: toggle.permission.as_str().to_owned(),
            enabled: toggle.enabled,
        })
        .collect();

    Ok(Json(UserPermissionsResponse {
        user_id,
        permissions: permission_names(permissions),
        overrides,
    }))
}
