use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use edsetu_core::{AppError, UserIdentity};
use tower_sessions::Session;
use tracing::info;

use crate::dto::UserIdentityResponse;
use crate::error::ApiResult;
use crate::state::AppState;

use super::SESSION_USER_KEY;

/// Stores `identity` in a freshly cycled session.
pub(super) async fn sign_in(session: &Session, identity: &UserIdentity) -> ApiResult<()> {
    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    Ok(())
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    let subject = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .map(|identity| identity.subject().to_owned());

    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    if let Some(subject) = subject {
        info!(%subject, "signed out");
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let role = state
        .authorization_service
        .role_of(identity.organization_id(), identity.subject())
        .await?;

    Ok(Json(UserIdentityResponse::from_identity(identity, role)))
}
