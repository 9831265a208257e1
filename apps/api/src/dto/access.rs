use edsetu_application::{PermissionDescriptor, RoleDefinition, UserRoleAssignment};
use edsetu_domain::{Permission, RoleType};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// API representation of a role in the organization registry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub role: String,
    pub display_name: String,
    pub description: String,
    pub rank: i32,
    pub permissions: Vec<String>,
}

/// API representation of a catalog permission.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-response.ts"
)]
pub struct PermissionResponse {
    pub permission: String,
    pub resource: String,
    pub action: String,
}

/// Enabled permissions of one role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-permissions-response.ts"
)]
pub struct RolePermissionsResponse {
    pub role: String,
    pub permissions: Vec<String>,
}

/// Incoming payload for a single permission toggle.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-toggle-request.ts"
)]
pub struct PermissionToggleRequest {
    pub permission: String,
    pub enabled: bool,
}

/// API representation of a per-user override.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-toggle-response.ts"
)]
pub struct PermissionToggleResponse {
    pub permission: String,
    pub enabled: bool,
}

/// Effective permissions and explicit overrides of one user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-permissions-response.ts"
)]
pub struct UserPermissionsResponse {
    pub user_id: String,
    pub permissions: Vec<String>,
    pub overrides: Vec<PermissionToggleResponse>,
}

/// Incoming payload for role assignment.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assign-role-request.ts"
)]
pub struct AssignRoleRequest {
    pub role_name: String,
    #[serde(default)]
    pub permission_overrides: Vec<PermissionToggleRequest>,
}

/// API representation of a role assignment.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-assignment-response.ts"
)]
pub struct RoleAssignmentResponse {
    pub organization_id: String,
    pub user_id: String,
    pub role: String,
    pub assigned_by: String,
    pub assigned_at: String,
}

/// Result of a permission check for the current user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-check-response.ts"
)]
pub struct PermissionCheckResponse {
    pub permission: String,
    pub allowed: bool,
}

/// Result of a hierarchy check between the current user and a role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/can-manage-response.ts"
)]
pub struct CanManageResponse {
    pub actor_role: String,
    pub target_role: String,
    pub allowed: bool,
}

pub(crate) fn permission_names(permissions: Vec<Permission>) -> Vec<String> {
    permissions
        .into_iter()
        .map(|permission| permission.as_str().to_owned())
        .collect()
}

impl From<RoleDefinition> for RoleResponse {
    fn from(value: RoleDefinition) -> Self {
        Self {
            role: value.role.as_str().to_owned(),
            display_name: value.display_name,
            description: value.description,
            rank: value.rank,
            permissions: permission_names(value.permissions),
        }
    }
}

impl From<PermissionDescriptor> for PermissionResponse {
    fn from(value: PermissionDescriptor) -> Self {
        Self {
            permission: value.permission.as_str().to_owned(),
            resource: value.resource.as_str().to_owned(),
            action: value.action.as_str().to_owned(),
        }
    }
}

impl From<UserRoleAssignment> for RoleAssignmentResponse {
    fn from(value: UserRoleAssignment) -> Self {
        Self {
            organization_id: value.organization_id.to_string(),
            user_id: value.user_id,
            role: value.role.as_str().to_owned(),
            assigned_by: value.assigned_by,
            assigned_at: value.assigned_at.to_rfc3339(),
        }
    }
}

impl RolePermissionsResponse {
    pub fn new(role: RoleType, permissions: Vec<Permission>) -> Self {
        Self {
            role: role.as_str().to_owned(),
            permissions: permission_names(permissions),
        }
    }
}
