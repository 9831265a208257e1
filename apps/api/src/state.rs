use std::sync::Arc;

use edsetu_application::{
    AuditService, AuthorizationService, Clock, InvitationService, PermissionBindingService,
    RoleAssignmentService, RoleRegistryService,
};
use edsetu_core::OrganizationId;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub role_registry_service: RoleRegistryService,
    pub permission_binding_service: PermissionBindingService,
    pub role_assignment_service: RoleAssignmentService,
    pub invitation_service: InvitationService,
    pub audit_service: AuditService,
    pub clock: Arc<dyn Clock>,
    pub bootstrap_token: String,
    pub bootstrap_organization_id: OrganizationId,
    pub frontend_url: String,
}
