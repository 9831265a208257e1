use edsetu_domain::{InvitationStatus, RoleType};

/// Input payload for issuing an invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateInvitationInput {
    /// Invitee email address.
    pub email: Option<String>,
    /// Invitee phone number.
    pub phone: Option<String>,
    /// Optional invitee display name.
    pub display_name: Option<String>,
    /// Role name granted on acceptance.
    pub role_name: String,
    /// Optional personal note delivered with the invitation.
    pub message: Option<String>,
}

/// Filters for invitation listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvitationQuery {
    /// Effective status filter.
    pub status: Option<InvitationStatus>,
    /// Role filter.
    pub role: Option<RoleType>,
}
