use chrono::{Duration, Utc};
use edsetu_application::{AssignmentRepository, InvitationRepository, UserRoleAssignment};
use edsetu_core::{AppError, OrganizationId};
use edsetu_domain::{Invitation, InvitationContact, InvitationDraft, InvitationStatus, RoleType};

use super::PostgresInvitationRepository;
use crate::PostgresAssignmentRepository;
use crate::postgres_test_support::{seeded_organization, test_pool};

fn pending(organization_id: OrganizationId, email: &str) -> Invitation {
    Invitation::issue(
        InvitationDraft {
            organization_id,
            contact: InvitationContact::new(Some(email), None)
                .unwrap_or_else(|_| panic!("contact")),
            display_name: None,
            role: RoleType::Student,
            invited_by: "alice".to_owned(),
            invited_by_name: "Alice".to_owned(),
            invited_by_role: RoleType::Admin,
            message: None,
        },
        Utc::now(),
    )
    .unwrap_or_else(|_| panic!("issue"))
}

fn assignment(organization_id: OrganizationId, user_id: &str) -> UserRoleAssignment {
    UserRoleAssignment {
        organization_id,
        user_id: user_id.to_owned(),
        role: RoleType::Student,
        assigned_by: "alice".to_owned(),
        assigned_at: Utc::now(),
    }
}

#[tokio::test]
async fn partial_unique_index_rejects_second_pending_invitation() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresInvitationRepository::new(pool.clone());
    let organization_id = seeded_organization(&pool).await;

    let first = pending(organization_id, "pat@example.com");
    assert!(repository.insert_invitation(&first).await.is_ok());

    let second = pending(organization_id, "pat@example.com");
    let result = repository.insert_invitation(&second).await;
    assert!(matches!(
        result,
        Err(AppError::DuplicatePendingInvitation(_))
    ));

    let mut revoked = first.clone();
    assert!(revoked.revoke(Utc::now()).is_ok());
    assert!(repository
        .update_invitation(&revoked, InvitationStatus::Pending)
        .await
        .is_ok());
    assert!(repository.insert_invitation(&second).await.is_ok());
}

#[tokio::test]
async fn status_update_is_compare_and_swap() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresInvitationRepository::new(pool.clone());
    let organization_id = seeded_organization(&pool).await;
    let invitation = pending(organization_id, "race@example.com");
    assert!(repository.insert_invitation(&invitation).await.is_ok());

    let mut revoked = invitation.clone();
    assert!(revoked.revoke(Utc::now()).is_ok());
    assert!(repository
        .update_invitation(&revoked, InvitationStatus::Pending)
        .await
        .is_ok());

    let mut accepted = invitation.clone();
    assert!(accepted.accept("pat", Utc::now()).is_ok());
    let result = repository
        .accept_invitation(&accepted, assignment(organization_id, "pat"))
        .await;
    assert!(matches!(result, Err(AppError::InvitationNotPending(_))));

    let assignments = PostgresAssignmentRepository::new(pool.clone());
    let stored = assignments.find_assignment(organization_id, "pat").await;
    assert!(matches!(stored, Ok(None)));
}

#[tokio::test]
async fn accept_rolls_back_when_user_already_has_role() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresInvitationRepository::new(pool.clone());
    let assignments = PostgresAssignmentRepository::new(pool.clone());
    let organization_id = seeded_organization(&pool).await;
    assert!(assignments
        .create_assignment(assignment(organization_id, "bob"), Default::default())
        .await
        .is_ok());

    let invitation = pending(organization_id, "bob@example.com");
    assert!(repository.insert_invitation(&invitation).await.is_ok());
    let mut accepted = invitation.clone();
    assert!(accepted.accept("bob", Utc::now()).is_ok());

    let result = repository
        .accept_invitation(&accepted, assignment(organization_id, "bob"))
        .await;
    assert!(matches!(result, Err(AppError::DuplicateAssignment(_))));

    let stored = repository
        .find_invitation(invitation.invitation_id())
        .await
        .unwrap_or_else(|_| panic!("find"))
        .unwrap_or_else(|| panic!("stored"));
    assert_eq!(stored.stored_status(), InvitationStatus::Pending);
}

#[tokio::test]
async fn expire_stale_only_touches_past_deadline_rows() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresInvitationRepository::new(pool.clone());
    let organization_id = seeded_organization(&pool).await;
    let invitation = pending(organization_id, "late@example.com");
    assert!(repository.insert_invitation(&invitation).await.is_ok());

    let nothing = repository
        .expire_stale(Some(organization_id), Utc::now())
        .await;
    assert!(matches!(nothing, Ok(ref rows) if rows.is_empty()));

    let expired = repository
        .expire_stale(Some(organization_id), Utc::now() + Duration::days(8))
        .await
        .unwrap_or_else(|_| panic!("expire"));
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].stored_status(), InvitationStatus::Expired);
    assert_eq!(
        expired[0].contact().email().map(|email| email.as_str()),
        Some("late@example.com")
    );
}
