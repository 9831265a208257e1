use axum::Json;
use axum::extract::{Path, State};
use edsetu_core::UserIdentity;
use tower_sessions::Session;
use uuid::Uuid;

use crate::dto::{AcceptInvitationRequest, RoleAssignmentResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::session::sign_in;

/// Accepts an invitation for the supplied user and signs that user in.
pub async fn accept_invitation_handler(
    State(state): State<AppState>,
    Path(invitation_id): Path<Uuid>,
    session: Session,
    Json(payload): Json<AcceptInvitationRequest>,
) -> ApiResult<Json<RoleAssignmentResponse>> {
    let assignment = state
        .invitation_service
        .accept_invitation(invitation_id, payload.user_id.as_str())
        .await?;

    let display_name = payload
        .display_name
        .unwrap_or_else(|| payload.user_id.clone());
    let identity = UserIdentity::new(
        payload.user_id,
        display_name,
        payload.email,
        assignment.organization_id,
    );
    sign_in(&session, &identity).await?;

    Ok(Json(RoleAssignmentResponse::from(assignment)))
}
