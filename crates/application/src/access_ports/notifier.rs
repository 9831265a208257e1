use async_trait::async_trait;
use chrono::{DateTime, Utc};
use edsetu_core::{AppResult, OrganizationId};
use edsetu_domain::{Invitation, RoleType};
use uuid::Uuid;

/// Delivery payload handed to the notification layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationNotice {
    /// Invitation identifier the recipient accepts.
    pub invitation_id: Uuid,
    /// Organization the recipient joins.
    pub organization_id: OrganizationId,
    /// Email channel.
    pub email: Option<String>,
    /// Phone channel.
    pub phone: Option<String>,
    /// Invitee display name, if known.
    pub display_name: Option<String>,
    /// Inviter display name.
    pub inviter_name: String,
    /// Role granted on acceptance.
    pub role: RoleType,
    /// Optional personal note.
    pub message: Option<String>,
    /// Acceptance deadline.
    pub expires_at: DateTime<Utc>,
    /// Whether this is a repeat delivery.
    pub is_resend: bool,
}

impl InvitationNotice {
    /// Builds the notice for an invitation.
    #[must_use]
    pub fn for_invitation(invitation: &Invitation, is_resend: bool) -> Self {
        let draft = invitation.draft();
        Self {
            invitation_id: invitation.invitation_id(),
            organization_id: invitation.organization_id(),
            email: draft
                .contact
                .email()
                .map(|email| email.as_str().to_owned()),
            phone: draft
                .contact
                .phone()
                .map(|phone| phone.as_str().to_owned()),
            display_name: draft.display_name.clone(),
            inviter_name: draft.invited_by_name.clone(),
            role: draft.role,
            message: draft.message.clone(),
            expires_at: invitation.expires_at(),
            is_resend,
        }
    }
}

/// Port for fire-and-forget invitation delivery (email/SMS).
#[async_trait]
pub trait InvitationNotifier: Send + Sync {
    /// Delivers one invitation notice.
    async fn send_invitation(&self, notice: &InvitationNotice) -> AppResult<()>;
}
