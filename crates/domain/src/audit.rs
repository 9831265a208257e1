use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when an organization's role catalog is seeded.
    OrganizationProvisioned,
    /// Emitted when a role is assigned to a user.
    RoleAssigned,
    /// Emitted when a user's role is revoked.
    RoleRevoked,
    /// Emitted when a role-level permission toggle changes.
    RolePermissionChanged,
    /// Emitted when a per-user permission override changes.
    UserPermissionChanged,
    /// Emitted when an invitation is issued.
    InvitationCreated,
    /// Emitted when an invitation is accepted.
    InvitationAccepted,
    /// Emitted when an invitation is revoked.
    InvitationRevoked,
    /// Emitted when an invitation deadline is extended.
    InvitationResent,
    /// Emitted when an invitation is moved to expired.
    InvitationExpired,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrganizationProvisioned => "organization.provisioned",
            Self::RoleAssigned => "role.assigned",
            Self::RoleRevoked => "role.revoked",
            Self::RolePermissionChanged => "role.permission_changed",
            Self::UserPermissionChanged => "user.permission_changed",
            Self::InvitationCreated => "invitation.created",
            Self::InvitationAccepted => "invitation.accepted",
            Self::InvitationRevoked => "invitation.revoked",
            Self::InvitationResent => "invitation.resent",
            Self::InvitationExpired => "invitation.expired",
        }
    }
}
