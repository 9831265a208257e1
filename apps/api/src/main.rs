//! EdSetu access-control API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use axum::Router;
use edsetu_core::AppError;
use tracing::{info, warn};

use crate::api_config::ApiConfig;
use crate::api_router::build_router;
use crate::api_services::{
    Storage, build_app_state, build_memory_session_layer, build_postgres_session_layer,
    connect_and_migrate,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    api_config::init_tracing();

    let config = ApiConfig::load()?;

    let storage = match config.database_url.as_deref() {
        Some(database_url) => Storage::Postgres(connect_and_migrate(database_url).await?),
        None => {
            if config.migrate_only {
                return Err(AppError::Validation(
                    "DATABASE_URL is required to run migrations".to_owned(),
                ));
            }
            warn!("DATABASE_URL is not set; using in-memory storage");
            Storage::InMemory
        }
    };

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let app_state = build_app_state(&storage, &config);
    let app: Router = match storage {
        Storage::Postgres(pool) => {
            let session_layer = build_postgres_session_layer(pool, config.cookie_secure).await?;
            build_router(app_state, &config.frontend_url, session_layer)?
        }
        Storage::InMemory => {
            let session_layer = build_memory_session_layer(config.cookie_secure);
            build_router(app_state, &config.frontend_url, session_layer)?
        }
    };

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "edsetu-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
