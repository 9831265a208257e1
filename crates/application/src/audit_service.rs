use std::sync::Arc;

use edsetu_core::{AppError, AppResult, UserIdentity};
use edsetu_domain::Permission;

use crate::{AuditLogEntry, AuditLogQuery, AuditLogRepository, AuthorizationService};

const MAX_AUDIT_PAGE_SIZE: usize = 200;

/// Application service for audit log reads.
#[derive(Clone)]
pub struct AuditService {
    authorization_service: AuthorizationService,
    audit_log_repository: Arc<dyn AuditLogRepository>,
}

impl AuditService {
    /// Creates a new audit service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        audit_log_repository: Arc<dyn AuditLogRepository>,
    ) -> Self {
        Self {
            authorization_service,
            audit_log_repository,
        }
    }

    /// Lists recent audit entries of the actor's organization.
    pub async fn list_audit_log(
        &self,
        actor: &UserIdentity,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        self.authorization_service
            .require_permission(actor.organization_id(), actor.subject(), Permission::ViewAuditLog)
            .await?;

        if query.limit == 0 || query.limit > MAX_AUDIT_PAGE_SIZE {
            return Err(AppError::Validation(format!(
                "audit log limit must be between 1 and {MAX_AUDIT_PAGE_SIZE}"
            )));
        }

        self.audit_log_repository
            .list_recent_entries(actor.organization_id(), query)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use edsetu_core::AppError;
    use edsetu_domain::{AuditAction, RoleType};

    use super::AuditService;
    use crate::test_support::{FakeAccessStore, actor, seeded_store, start_time};
    use crate::{AuditEvent, AuditLogQuery, AuditRepository, AuthorizationService};

    fn service(store: &Arc<FakeAccessStore>) -> AuditService {
        AuditService::new(
            AuthorizationService::new(store.clone(), store.clone()),
            store.clone(),
        )
    }

    fn query(limit: usize) -> AuditLogQuery {
        AuditLogQuery {
            limit,
            offset: 0,
            action: None,
            subject: None,
        }
    }

    #[tokio::test]
    async fn admin_reads_newest_entries_first() {
        let (store, organization_id) = seeded_store().await;
        for user_id in ["bob", "carol"] {
            let appended = store
                .append_event(AuditEvent {
                    organization_id,
                    subject: "alice".to_owned(),
                    action: AuditAction::RoleAssigned,
                    resource_type: "user_role".to_owned(),
                    resource_id: user_id.to_owned(),
                    previous_state: None,
                    new_state: Some("student".to_owned()),
                    detail: None,
                    occurred_at: start_time(),
                })
                .await;
            assert!(appended.is_ok());
        }

        let entries = service(&store)
            .list_audit_log(&actor(organization_id, "alice"), query(10))
            .await
            .unwrap_or_else(|_| panic!("audit log"));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].resource_id, "carol");
        assert_eq!(entries[0].action, "role.assigned");
    }

    #[tokio::test]
    async fn audit_log_requires_view_permission_and_sane_limit() {
        let (store, organization_id) = seeded_store().await;
        store
            .put_assignment(organization_id, "ivan", RoleType::Instructor)
            .await;
        let service = service(&store);

        assert!(matches!(
            service
                .list_audit_log(&actor(organization_id, "ivan"), query(10))
                .await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service
                .list_audit_log(&actor(organization_id, "alice"), query(0))
                .await,
            Err(AppError::Validation(_))
        ));
    }
}
