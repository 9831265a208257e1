use chrono::{DateTime, Utc};
use edsetu_domain::{Invitation, RoleType};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for invitation creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-invitation-request.ts"
)]
pub struct CreateInvitationRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub display_name: Option<String>,
    pub role_name: String,
    pub message: Option<String>,
}

/// API representation of an invitation with its effective status.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/invitation-response.ts"
)]
pub struct InvitationResponse {
    pub invitation_id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub display_name: Option<String>,
    pub role: String,
    pub invited_by: String,
    pub invited_by_name: String,
    pub status: String,
    pub message: Option<String>,
    pub created_at: String,
    pub expires_at: String,
    pub accepted_at: Option<String>,
    pub accepted_by: Option<String>,
}

impl InvitationResponse {
    pub fn from_invitation(invitation: &Invitation, now: DateTime<Utc>) -> Self {
        let draft = invitation.draft();
        Self {
            invitation_id: invitation.invitation_id().to_string(),
            email: draft
                .contact
                .email()
                .map(|email| email.as_str().to_owned()),
            phone: draft
                .contact
                .phone()
                .map(|phone| phone.as_str().to_owned()),
            display_name: draft.display_name.clone(),
            role: invitation.role().as_str().to_owned(),
            invited_by: invitation.invited_by().to_owned(),
            invited_by_name: draft.invited_by_name.clone(),
            status: invitation.effective_status(now).as_str().to_owned(),
            message: draft.message.clone(),
            created_at: invitation.created_at().to_rfc3339(),
            expires_at: invitation.expires_at().to_rfc3339(),
            accepted_at: invitation.accepted_at().map(|value| value.to_rfc3339()),
            accepted_by: invitation.accepted_by().map(ToOwned::to_owned),
        }
    }
}

/// Pending invitation count for one role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/pending-count-response.ts"
)]
pub struct PendingCountResponse {
    pub role: String,
    pub count: usize,
}

impl PendingCountResponse {
    pub fn new(role: RoleType, count: usize) -> Self {
        Self {
            role: role.as_str().to_owned(),
            count,
        }
    }
}
