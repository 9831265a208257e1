use edsetu_core::AppError;
use sqlx::PgPool;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

pub async fn build_postgres_session_layer(
    pool: PgPool,
    cookie_secure: bool,
) -> Result<SessionManagerLayer<PostgresStore>, AppError> {
    let session_store = PostgresStore::new(pool)
        .with_table_name("tower_sessions")
        .map_err(|error| {
            AppError::Validation(format!("invalid session table name configuration: {error}"))
        })?;

    session_store.migrate().await.map_err(|error| {
        AppError::Internal(format!("failed to initialize session store: {error}"))
    })?;

    Ok(configure(SessionManagerLayer::new(session_store), cookie_secure))
}

pub fn build_memory_session_layer(cookie_secure: bool) -> SessionManagerLayer<MemoryStore> {
    configure(SessionManagerLayer::new(MemoryStore::default()), cookie_secure)
}

fn configure<S>(layer: SessionManagerLayer<S>, cookie_secure: bool) -> SessionManagerLayer<S>
where
    S: tower_sessions::SessionStore,
{
    layer
        .with_secure(cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(30)))
}
