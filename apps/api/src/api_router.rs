use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use edsetu_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::state::AppState;
use crate::{auth, handlers, middleware};

mod cors;

pub fn build_router<S>(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<S>,
) -> Result<Router, AppError>
where
    S: SessionStore + Clone,
{
    let protected_routes = Router::new()
        .route("/api/roles", get(handlers::roles::list_roles_handler))
        .route("/api/roles/{role}", get(handlers::roles::get_role_handler))
        .route(
            "/api/roles/{role}/permissions",
            get(handlers::roles::role_permissions_handler)
                .put(handlers::roles::set_role_permission_handler),
        )
        .route(
            "/api/permissions",
            get(handlers::roles::list_permissions_handler),
        )
        .route(
            "/api/users/{user_id}/role",
            get(handlers::users::user_role_handler)
                .put(handlers::users::assign_role_handler)
                .delete(handlers::users::revoke_role_handler),
        )
        .route(
            "/api/users/{user_id}/permissions",
            get(handlers::users::user_permissions_handler)
                .put(handlers::users::set_user_permission_handler),
        )
        .route(
            "/api/role-assignments",
            get(handlers::users::list_role_assignments_handler),
        )
        .route(
            "/api/authorization/check",
            get(handlers::authorization::check_permission_handler),
        )
        .route(
            "/api/authorization/can-manage",
            get(handlers::authorization::can_manage_handler),
        )
        .route(
            "/api/invitations",
            get(handlers::invitations::list_invitations_handler)
                .post(handlers::invitations::create_invitation_handler),
        )
        .route(
            "/api/invitations/pending-counts",
            get(handlers::invitations::pending_counts_handler),
        )
        .route(
            "/api/invitations/{invitation_id}/revoke",
            post(handlers::invitations::revoke_invitation_handler),
        )
        .route(
            "/api/invitations/{invitation_id}/resend",
            post(handlers::invitations::resend_invitation_handler),
        )
        .route("/api/audit-log", get(handlers::audit::list_audit_log_handler))
        .route("/auth/me", get(auth::me_handler))
        .route_layer(from_fn(middleware::require_auth));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route(
            "/invitations/{invitation_id}/accept",
            post(auth::accept_invitation_handler),
        )
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .layer(session_layer)
        .with_state(app_state))
}
