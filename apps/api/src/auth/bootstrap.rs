use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use edsetu_core::{AppError, OrganizationId, UserIdentity};
use tower_sessions::Session;
use tracing::info;

use crate::dto::BootstrapRequest;
use crate::error::ApiResult;
use crate::state::AppState;

use super::session::sign_in;

/// Signs in with the bootstrap token, provisioning the organization on first use.
pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<StatusCode> {
    if payload.token != state.bootstrap_token {
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let organization_id = payload
        .organization_id
        .as_deref()
        .map(|value| {
            uuid::Uuid::parse_str(value)
                .map(OrganizationId::from_uuid)
                .map_err(|error| AppError::Validation(format!("invalid organization id: {error}")))
        })
        .transpose()?
        .unwrap_or(state.bootstrap_organization_id);

    let existing_role = state
        .authorization_service
        .role_of(organization_id, payload.subject.as_str())
        .await?;
    if existing_role.is_none() {
        state
            .role_registry_service
            .provision_organization(organization_id, payload.subject.as_str())
            .await?;
    }

    let display_name = payload
        .display_name
        .unwrap_or_else(|| payload.subject.clone());
    let identity = UserIdentity::new(
        payload.subject.clone(),
        display_name,
        payload.email,
        organization_id,
    );
    sign_in(&session, &identity).await?;

    info!(subject = %payload.subject, %organization_id, "bootstrap sign-in");
    Ok(StatusCode::NO_CONTENT)
}
