mod access;
mod audit;
mod common;
mod invitations;

pub(crate) use access::permission_names;
pub use access::{
    AssignRoleRequest, CanManageResponse, PermissionCheckResponse, PermissionResponse,
    PermissionToggleRequest, PermissionToggleResponse, RoleAssignmentResponse, RoleResponse,
    RolePermissionsResponse, UserPermissionsResponse,
};
pub use audit::AuditLogEntryResponse;
pub use common::{
    AcceptInvitationRequest, BootstrapRequest, HealthResponse, UserIdentityResponse,
};
pub use invitations::{CreateInvitationRequest, InvitationResponse, PendingCountResponse};
