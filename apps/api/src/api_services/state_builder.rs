use std::sync::Arc;

use edsetu_application::{
    AssignmentRepository, AuditLogRepository, AuditRepository, AuditService,
    AuthorizationService, Clock, InvitationRepository, InvitationService,
    PermissionBindingService, RoleAssignmentService, RoleRegistryService, RoleRepository,
};
use edsetu_core::OrganizationId;
use edsetu_infrastructure::{
    InMemoryAccessRepository, PostgresAssignmentRepository, PostgresAuditLogRepository,
    PostgresAuditRepository, PostgresInvitationRepository, PostgresRoleRepository, SystemClock,
};
use sqlx::PgPool;
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::AppState;

use super::notifier::build_notifier;

/// Backing store selected at startup.
pub enum Storage {
    Postgres(PgPool),
    InMemory,
}

struct RepositorySet {
    role_repository: Arc<dyn RoleRepository>,
    assignment_repository: Arc<dyn AssignmentRepository>,
    invitation_repository: Arc<dyn InvitationRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    audit_log_repository: Arc<dyn AuditLogRepository>,
}

fn build_repository_set(storage: &Storage) -> RepositorySet {
    match storage {
        Storage::Postgres(pool) => RepositorySet {
            role_repository: Arc::new(PostgresRoleRepository::new(pool.clone())),
            assignment_repository: Arc::new(PostgresAssignmentRepository::new(pool.clone())),
            invitation_repository: Arc::new(PostgresInvitationRepository::new(pool.clone())),
            audit_repository: Arc::new(PostgresAuditRepository::new(pool.clone())),
            audit_log_repository: Arc::new(PostgresAuditLogRepository::new(pool.clone())),
        },
        Storage::InMemory => {
            let repository = Arc::new(InMemoryAccessRepository::new());
            RepositorySet {
                role_repository: repository.clone(),
                assignment_repository: repository.clone(),
                invitation_repository: repository.clone(),
                audit_repository: repository.clone(),
                audit_log_repository: repository,
            }
        }
    }
}

pub fn build_app_state(storage: &Storage, config: &ApiConfig) -> AppState {
    let repositories = build_repository_set(storage);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let authorization_service = AuthorizationService::new(
        repositories.role_repository.clone(),
        repositories.assignment_repository.clone(),
    );

    let bootstrap_organization_id = config.bootstrap_organization_id.unwrap_or_else(|| {
        let generated = OrganizationId::new();
        info!(organization_id = %generated, "BOOTSTRAP_ORGANIZATION_ID not set; generated one");
        generated
    });

    AppState {
        role_registry_service: RoleRegistryService::new(
            repositories.role_repository.clone(),
            repositories.assignment_repository.clone(),
            repositories.audit_repository.clone(),
            clock.clone(),
        ),
        permission_binding_service: PermissionBindingService::new(
            authorization_service.clone(),
            repositories.role_repository,
            repositories.assignment_repository.clone(),
            repositories.audit_repository.clone(),
            clock.clone(),
        ),
        role_assignment_service: RoleAssignmentService::new(
            authorization_service.clone(),
            repositories.assignment_repository,
            repositories.audit_repository.clone(),
            clock.clone(),
        ),
        invitation_service: InvitationService::new(
            authorization_service.clone(),
            repositories.invitation_repository,
            repositories.audit_repository,
            build_notifier(&config.notifier_provider),
            clock.clone(),
        ),
        audit_service: AuditService::new(
            authorization_service.clone(),
            repositories.audit_log_repository,
        ),
        authorization_service,
        clock,
        bootstrap_token: config.bootstrap_token.clone(),
        bootstrap_organization_id,
        frontend_url: config.frontend_url.clone(),
    }
}
