use chrono::{DateTime, Utc};
use edsetu_core::OrganizationId;
use edsetu_domain::{Permission, PermissionAction, PermissionResource, RoleType};

/// Organization-scoped role catalog entry returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDefinition {
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Role identity.
    pub role: RoleType,
    /// Human-readable label.
    pub display_name: String,
    /// Short description.
    pub description: String,
    /// Hierarchy rank; higher is more privileged.
    pub rank: i32,
    /// Enabled role-level permissions in catalog order.
    pub permissions: Vec<Permission>,
}

/// Active role held by a user inside an organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRoleAssignment {
    /// Organization scope.
    pub organization_id: OrganizationId,
    /// Opaque user identifier from the user directory.
    pub user_id: String,
    /// Assigned role.
    pub role: RoleType,
    /// Subject that granted the role, or `system` for provisioning.
    pub assigned_by: String,
    /// Assignment timestamp.
    pub assigned_at: DateTime<Utc>,
}

/// One explicit permission toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionToggle {
    /// Catalog permission.
    pub permission: Permission,
    /// Whether the permission is granted.
    pub enabled: bool,
}

/// Input payload for direct role assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignRoleInput {
    /// Target user identifier.
    pub user_id: String,
    /// Role name from the registry.
    pub role_name: String,
    /// Per-user overrides stored together with the assignment.
    pub permission_overrides: Vec<PermissionToggle>,
}

/// Filters for assignment listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignmentQuery {
    /// Optional role filter.
    pub role: Option<RoleType>,
}

/// Catalog entry describing one permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionDescriptor {
    /// Catalog permission.
    pub permission: Permission,
    /// Resource the permission applies to.
    pub resource: PermissionResource,
    /// Action verb.
    pub action: PermissionAction,
}

impl From<Permission> for PermissionDescriptor {
    fn from(permission: Permission) -> Self {
        Self {
            permission,
            resource: permission.resource(),
            action: permission.action(),
        }
    }
}
