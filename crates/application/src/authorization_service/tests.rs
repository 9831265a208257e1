use std::sync::Arc;

use edsetu_core::AppError;
use edsetu_domain::{Permission, PermissionBinding, RoleType};

use crate::AssignmentRepository;
use crate::test_support::{FakeAccessStore, seeded_store};

use super::AuthorizationService;

fn service(store: &Arc<FakeAccessStore>) -> AuthorizationService {
    AuthorizationService::new(store.clone(), store.clone())
}

#[tokio::test]
async fn require_permission_allows_granted_member() {
    let (store, organization_id) = seeded_store().await;
    let service = service(&store);

    let result = service
        .require_permission(organization_id, "alice", Permission::ManageRoles)
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn users_without_assignment_are_denied() {
    let (store, organization_id) = seeded_store().await;
    let service = service(&store);

    let allowed = service
        .can(organization_id, "mallory", Permission::ViewCourses)
        .await;
    assert!(matches!(allowed, Ok(false)));

    let result = service
        .require_permission(organization_id, "mallory", Permission::ViewCourses)
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn user_override_takes_precedence_over_role_binding() {
    let (store, organization_id) = seeded_store().await;
    store
        .put_assignment(organization_id, "umar", RoleType::SubAdmin)
        .await;
    store
        .put_assignment(organization_id, "vera", RoleType::SubAdmin)
        .await;
    let overrides = PermissionBinding::from_entries([(Permission::ManageStudents, true)]);
    let saved = store
        .save_user_overrides(organization_id, "umar", &overrides)
        .await;
    assert!(saved.is_ok());
    let service = service(&store);

    assert!(matches!(
        service
            .can(organization_id, "umar", Permission::ManageStudents)
            .await,
        Ok(true)
    ));
    assert!(matches!(
        service
            .can(organization_id, "vera", Permission::ManageStudents)
            .await,
        Ok(false)
    ));
    assert!(matches!(
        service
            .can_role(organization_id, RoleType::SubAdmin, Permission::ManageStudents)
            .await,
        Ok(false)
    ));
}

#[tokio::test]
async fn can_role_reports_missing_role_as_not_found() {
    let store = Arc::new(FakeAccessStore::default());
    let service = service(&store);

    let result = service
        .can_role(
            edsetu_core::OrganizationId::new(),
            RoleType::Student,
            Permission::ViewCourses,
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[test]
fn can_manage_is_strict() {
    for actor in RoleType::all() {
        for target in RoleType::all() {
            assert_eq!(
                AuthorizationService::can_manage(*actor, *target),
                actor.rank() > target.rank()
            );
        }
    }
    assert!(!AuthorizationService::can_manage(
        RoleType::SubAdmin,
        RoleType::SubAdmin
    ));
}

#[test]
fn authorize_assignment_rejects_peers_and_non_members() {
    assert!(AuthorizationService::authorize_assignment(Some(RoleType::Admin), RoleType::SubAdmin).is_ok());
    assert!(matches!(
        AuthorizationService::authorize_assignment(Some(RoleType::SubAdmin), RoleType::Admin),
        Err(AppError::AssignerNotAuthorized(_))
    ));
    assert!(matches!(
        AuthorizationService::authorize_assignment(Some(RoleType::Instructor), RoleType::Instructor),
        Err(AppError::AssignerNotAuthorized(_))
    ));
    assert!(matches!(
        AuthorizationService::authorize_assignment(None, RoleType::Student),
        Err(AppError::AssignerNotAuthorized(_))
    ));
}
