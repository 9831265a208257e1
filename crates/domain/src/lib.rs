//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod contact;
mod invitation;
mod permission;
mod role;

pub use audit::AuditAction;
pub use contact::{EmailAddress, InvitationContact, PhoneNumber};
pub use invitation::{INVITATION_TTL_DAYS, Invitation, InvitationDraft, InvitationStatus};
pub use permission::{
    Permission, PermissionAction, PermissionBinding, PermissionResource, default_binding_for_role,
};
pub use role::RoleType;
