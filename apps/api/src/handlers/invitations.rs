use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use edsetu_application::{CreateInvitationInput, InvitationQuery};
use edsetu_core::UserIdentity;
use edsetu_domain::{InvitationStatus, RoleType};
use serde::Deserialize;
use uuid::Uuid;

use crate::dto::{CreateInvitationRequest, InvitationResponse, PendingCountResponse};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InvitationListQuery {
    pub status: Option<String>,
    pub role: Option<String>,
}

pub async fn list_invitations_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<InvitationListQuery>,
) -> ApiResult<Json<Vec<InvitationResponse>>> {
    let filter = InvitationQuery {
        status: query
            .status
            .as_deref()
            .map(str::parse::<InvitationStatus>)
            .transpose()?,
        role: query
            .role
            .as_deref()
            .map(RoleType::from_transport)
            .transpose()?,
    };

    let now = state.clock.now();
    let invitations = state
        .invitation_service
        .list_invitations(&user, filter)
        .await?
        .iter()
        .map(|invitation| InvitationResponse::from_invitation(invitation, now))
        .collect();

    Ok(Json(invitations))
}

pub async fn create_invitation_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateInvitationRequest>,
) -> ApiResult<(StatusCode, Json<InvitationResponse>)> {
    let invitation = state
        .invitation_service
        .create_invitation(
            &user,
            CreateInvitationInput {
                email: payload.email,
                phone: payload.phone,
                display_name: payload.display_name,
                role_name: payload.role_name,
                message: payload.message,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(InvitationResponse::from_invitation(
            &invitation,
            state.clock.now(),
        )),
    ))
}

pub async fn pending_counts_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<PendingCountResponse>>> {
    let counts = state
        .invitation_service
        .count_pending_by_role(&user)
        .await?
        .into_iter()
        .rev()
        .map(|(role, count)| PendingCountResponse::new(role, count))
        .collect();

    Ok(Json(counts))
}

pub async fn revoke_invitation_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(invitation_id): Path<Uuid>,
) -> ApiResult<Json<InvitationResponse>> {
    let invitation = state
        .invitation_service
        .revoke_invitation(&user, invitation_id)
        .await?;

    Ok(Json(InvitationResponse::from_invitation(
        &invitation,
        state.clock.now(),
    )))
}

pub async fn resend_invitation_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(invitation_id): Path<Uuid>,
) -> ApiResult<Json<InvitationResponse>> {
    let invitation = state
        .invitation_service
        .resend_invitation(&user, invitation_id)
        .await?;

    Ok(Json(InvitationResponse::from_invitation(
        &invitation,
        state.clock.now(),
    )))
}
