use chrono::Utc;
use edsetu_application::{AuditEvent, AuditLogQuery, AuditLogRepository, AuditRepository};
use edsetu_domain::AuditAction;

use super::PostgresAuditLogRepository;
use crate::PostgresAuditRepository;
use crate::postgres_test_support::{seeded_organization, test_pool};

fn event(
    organization_id: edsetu_core::OrganizationId,
    subject: &str,
    action: AuditAction,
) -> AuditEvent {
    AuditEvent {
        organization_id,
        subject: subject.to_owned(),
        action,
        resource_type: "user_role_assignment".to_owned(),
        resource_id: "carol".to_owned(),
        previous_state: None,
        new_state: Some("student".to_owned()),
        detail: None,
        occurred_at: Utc::now(),
    }
}

#[tokio::test]
async fn list_recent_entries_filters_by_action_and_subject() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let organization_id = seeded_organization(&pool).await;
    let writer = PostgresAuditRepository::new(pool.clone());
    let reader = PostgresAuditLogRepository::new(pool.clone());

    for (subject, action) in [
        ("alice", AuditAction::RoleAssigned),
        ("bob", AuditAction::RoleAssigned),
        ("alice", AuditAction::InvitationCreated),
    ] {
        assert!(
            writer
                .append_event(event(organization_id, subject, action))
                .await
                .is_ok()
        );
    }

    let assigned_by_alice = reader
        .list_recent_entries(
            organization_id,
            AuditLogQuery {
                limit: 50,
                offset: 0,
                action: Some(AuditAction::RoleAssigned.as_str().to_owned()),
                subject: Some("alice".to_owned()),
            },
        )
        .await
        .unwrap_or_default();
    assert_eq!(assigned_by_alice.len(), 1);
    assert_eq!(assigned_by_alice[0].new_state.as_deref(), Some("student"));

    let first_page = reader
        .list_recent_entries(
            organization_id,
            AuditLogQuery {
                limit: 2,
                offset: 0,
                action: None,
                subject: None,
            },
        )
        .await
        .unwrap_or_default();
    assert_eq!(first_page.len(), 2);
}

#[tokio::test]
async fn list_recent_entries_is_scoped_to_organization() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let organization_id = seeded_organization(&pool).await;
    let other_organization_id = seeded_organization(&pool).await;
    let writer = PostgresAuditRepository::new(pool.clone());
    let reader = PostgresAuditLogRepository::new(pool.clone());

    assert!(
        writer
            .append_event(event(organization_id, "alice", AuditAction::RoleRevoked))
            .await
            .is_ok()
    );

    let entries = reader
        .list_recent_entries(
            other_organization_id,
            AuditLogQuery {
                limit: 50,
                offset: 0,
                action: None,
                subject: None,
            },
        )
        .await
        .unwrap_or_default();
    assert!(entries.is_empty());
}
