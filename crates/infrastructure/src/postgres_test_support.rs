//! Connection helpers for PostgreSQL adapter tests; tests are skipped without `DATABASE_URL`.

use edsetu_application::RoleRepository;
use edsetu_core::OrganizationId;
use edsetu_domain::{RoleType, default_binding_for_role};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use crate::PostgresRoleRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub(crate) async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres access tests: {error}");
    }

    Some(pool)
}

pub(crate) async fn seeded_organization(pool: &PgPool) -> OrganizationId {
    let organization_id = OrganizationId::new();
    let seeded = PostgresRoleRepository::new(pool.clone())
        .seed_roles(
            organization_id,
            RoleType::all()
                .iter()
                .map(|role| (*role, default_binding_for_role(*role)))
                .collect(),
        )
        .await;
    assert!(seeded.is_ok());
    organization_id
}
