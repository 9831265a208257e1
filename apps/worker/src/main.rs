//! EdSetu invitation expiry worker.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use edsetu_application::{AuthorizationService, InvitationService};
use edsetu_core::{AppError, AppResult};
use edsetu_infrastructure::{
    ConsoleInvitationNotifier, PostgresAssignmentRepository, PostgresAuditRepository,
    PostgresInvitationRepository, PostgresRoleRepository, SystemClock,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct WorkerConfig {
    database_url: String,
    poll_interval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let pool = connect_pool(config.database_url.as_str()).await?;
    let invitation_service = build_invitation_service(pool);

    info!(
        poll_interval_ms = config.poll_interval_ms,
        "edsetu-worker started"
    );

    loop {
        match invitation_service.expire_stale_invitations(None).await {
            Ok(expired) => debug!(expired, "invitation expiry sweep finished"),
            Err(error) => warn!(error = %error, "invitation expiry sweep failed"),
        }

        tokio::time::sleep(Duration::from_millis(config.poll_interval_ms)).await;
    }
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

fn build_invitation_service(pool: PgPool) -> InvitationService {
    let authorization_service = AuthorizationService::new(
        Arc::new(PostgresRoleRepository::new(pool.clone())),
        Arc::new(PostgresAssignmentRepository::new(pool.clone())),
    );

    InvitationService::new(
        authorization_service,
        Arc::new(PostgresInvitationRepository::new(pool.clone())),
        Arc::new(PostgresAuditRepository::new(pool)),
        Arc::new(ConsoleInvitationNotifier::new()),
        Arc::new(SystemClock),
    )
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;
        let poll_interval_ms = parse_env_u64("WORKER_POLL_INTERVAL_MS", 60_000)?;

        if poll_interval_ms == 0 {
            return Err(AppError::Validation(
                "WORKER_POLL_INTERVAL_MS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            poll_interval_ms,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
