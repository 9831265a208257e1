use edsetu_core::UserIdentity;
use edsetu_domain::RoleType;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// API representation of the authenticated user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-identity-response.ts"
)]
pub struct UserIdentityResponse {
    pub subject: String,
    pub display_name: String,
    pub email: Option<String>,
    pub organization_id: String,
    pub role: Option<String>,
}

impl UserIdentityResponse {
    pub fn from_identity(identity: UserIdentity, role: Option<RoleType>) -> Self {
        Self {
            subject: identity.subject().to_owned(),
            display_name: identity.display_name().to_owned(),
            email: identity.email().map(ToOwned::to_owned),
            organization_id: identity.organization_id().to_string(),
            role: role.map(|value| value.as_str().to_owned()),
        }
    }
}

/// Incoming payload for bootstrap sign-in.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/bootstrap-request.ts"
)]
pub struct BootstrapRequest {
    pub subject: String,
    pub token: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub organization_id: Option<String>,
}

/// Incoming payload for invitation acceptance.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/accept-invitation-request.ts"
)]
pub struct AcceptInvitationRequest {
    pub user_id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}
