mod audit;
mod clock;
mod invitations;
mod notifier;
mod repositories;
mod roles;

pub use audit::{AuditEvent, AuditLogEntry, AuditLogQuery};
pub use clock::Clock;
pub use invitations::{CreateInvitationInput, InvitationQuery};
pub use notifier::{InvitationNotice, InvitationNotifier};
pub use repositories::{
    AssignmentRepository, AuditLogRepository, AuditRepository, InvitationRepository,
    RoleRepository,
};
pub use roles::{
    AssignRoleInput, AssignmentQuery, PermissionDescriptor, PermissionToggle, RoleDefinition,
    UserRoleAssignment,
};
