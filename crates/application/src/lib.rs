//! Application services and ports.

#![forbid(unsafe_code)]

mod access_ports;
mod audit_service;
mod authorization_service;
mod invitation_service;
mod permission_binding_service;
mod role_assignment_service;
mod role_registry_service;

#[cfg(test)]
mod test_support;

pub use access_ports::{
    AssignRoleInput, AssignmentQuery, AssignmentRepository, AuditEvent, AuditLogEntry,
    AuditLogQuery, AuditLogRepository, AuditRepository, Clock, CreateInvitationInput,
    InvitationNotice, InvitationNotifier, InvitationQuery, InvitationRepository,
    PermissionDescriptor, PermissionToggle, RoleDefinition, RoleRepository, UserRoleAssignment,
};
pub use audit_service::AuditService;
pub use authorization_service::AuthorizationService;
pub use invitation_service::InvitationService;
pub use permission_binding_service::PermissionBindingService;
pub use role_assignment_service::RoleAssignmentService;
pub use role_registry_service::{RoleRegistryService, SYSTEM_SUBJECT};
