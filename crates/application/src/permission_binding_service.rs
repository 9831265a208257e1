use std::str::FromStr;
use std::sync::Arc;

use edsetu_core::{AppError, AppResult, UserIdentity};
use edsetu_domain::{AuditAction, Permission, RoleType};
use tracing::info;

use crate::{
    AssignmentRepository, AuditEvent, AuditRepository, AuthorizationService, Clock,
    PermissionDescriptor, PermissionToggle, RoleRepository,
};

/// Application service for role-level bindings and per-user overrides.
#[derive(Clone)]
pub struct PermissionBindingService {
    authorization_service: AuthorizationService,
    role_repository: Arc<dyn RoleRepository>,
    assignment_repository: Arc<dyn AssignmentRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    clock: Arc<dyn Clock>,
}

impl PermissionBindingService {
    /// Creates a new permission binding service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        role_repository: Arc<dyn RoleRepository>,
        assignment_repository: Arc<dyn AssignmentRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            authorization_service,
            role_repository,
            assignment_repository,
            audit_repository,
            clock,
        }
    }

    /// Returns the static permission catalog.
    #[must_use]
    pub fn list_permissions() -> Vec<PermissionDescriptor> {
        Permission::all()
            .iter()
            .copied()
            .map(PermissionDescriptor::from)
            .collect()
    }

    /// Returns the enabled role-level permissions of a role.
    pub async fn permissions_for_role(
        &self,
        actor: &UserIdentity,
        role_name: &str,
    ) -> AppResult<Vec<Permission>> {
        let role = RoleType::from_str(role_name)?;
        self.authorization_service.require_member(actor).await?;

        Ok(self
            .authorization_service
            .role_binding(actor.organization_id(), role)
            .await?
            .enabled())
    }

    /// Returns the effective permissions of a user.
    ///
    /// Members may always read their own set; reading someone else's needs
    /// `view_users`.
    pub async fn effective_permissions_for_user(
        &self,
        actor: &UserIdentity,
        user_id: &str,
    ) -> AppResult<Vec<Permission>> {
        self.require_user_visibility(actor, user_id).await?;

        let (_, binding) = self
            .authorization_service
            .effective_binding(actor.organization_id(), user_id)
            .await?
            .ok_or_else(|| no_role(user_id))?;
        Ok(binding.enabled())
    }

    /// Returns the explicit overrides stored for a user.
    pub async fn user_overrides(
        &self,
        actor: &UserIdentity,
        user_id: &str,
    ) -> AppResult<Vec<PermissionToggle>> {
        self.require_user_visibility(actor, user_id).await?;

        let organization_id = actor.organization_id();
        if self
            .assignment_repository
            .find_assignment(organization_id, user_id)
            .await?
            .is_none()
        {
            return Err(no_role(user_id));
        }

        Ok(self
            .assignment_repository
            .find_user_overrides(organization_id, user_id)
            .await?
            .entries()
            .map(|(permission, enabled)| PermissionToggle {
                permission,
                enabled,
            })
            .collect())
    }

    /// Toggles one permission on a role-level binding.
    pub async fn set_role_permission(
        &self,
        actor: &UserIdentity,
        role_name: &str,
        permission_name: &str,
        enabled: bool,
    ) -> AppResult<Vec<Permission>> {
        let permission = Permission::from_str(permission_name)?;
        let role = RoleType::from_str(role_name)?;
        let actor_role = self.require_binding_editor(actor).await?;
        if !AuthorizationService::can_manage(actor_role, role) {
            return Err(AppError::Forbidden(format!(
                "role '{actor_role}' cannot edit permissions of role '{role}'"
            )));
        }

        let organization_id = actor.organization_id();
        let mut binding = self
            .authorization_service
            .role_binding(organization_id, role)
            .await?;
        let previous = binding.allows(permission);
        binding.set(permission, enabled);
        self.role_repository
            .save_role_binding(organization_id, role, &binding)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                organization_id,
                subject: actor.subject().to_owned(),
                action: AuditAction::RolePermissionChanged,
                resource_type: "role_permission".to_owned(),
                resource_id: format!("{role}:{permission}"),
                previous_state: Some(toggle_state(previous).to_owned()),
                new_state: Some(toggle_state(enabled).to_owned()),
                detail: None,
                occurred_at: self.clock.now(),
            })
            .await?;

        info!(%organization_id, %role, %permission, enabled, "role permission changed");
        Ok(binding.enabled())
    }

    /// Stores a per-user override for one permission.
    pub async fn set_user_permission(
        &self,
        actor: &UserIdentity,
        user_id: &str,
        permission_name: &str,
        enabled: bool,
    ) -> AppResult<Vec<Permission>> {
        let permission = Permission::from_str(permission_name)?;
        let actor_role = self.require_binding_editor(actor).await?;

        let organization_id = actor.organization_id();
        let assignment = self
            .assignment_repository
            .find_assignment(organization_id, user_id)
            .await?
            .ok_or_else(|| no_role(user_id))?;
        if !AuthorizationService::can_manage(actor_role, assignment.role) {
            return Err(AppError::Forbidden(format!(
                "role '{actor_role}' cannot edit permissions of a '{}' member",
                assignment.role
            )));
        }

        let role_binding = self
            .authorization_service
            .role_binding(organization_id, assignment.role)
            .await?;
        let mut overrides = self
            .assignment_repository
            .find_user_overrides(organization_id, user_id)
            .await?;
        let previous = role_binding.overlay(&overrides).allows(permission);
        overrides.set(permission, enabled);
        self.assignment_repository
            .save_user_overrides(organization_id, user_id, &overrides)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                organization_id,
                subject: actor.subject().to_owned(),
                action: AuditAction::UserPermissionChanged,
                resource_type: "user_permission".to_owned(),
                resource_id: format!("{user_id}:{permission}"),
                previous_state: Some(toggle_state(previous).to_owned()),
                new_state: Some(toggle_state(enabled).to_owned()),
                detail: None,
                occurred_at: self.clock.now(),
            })
            .await?;

        Ok(role_binding.overlay(&overrides).enabled())
    }

    async fn require_binding_editor(&self, actor: &UserIdentity) -> AppResult<RoleType> {
        let actor_role = self.authorization_service.require_member(actor).await?;
        self.authorization_service
            .require_permission(actor.organization_id(), actor.subject(), Permission::ManageRoles)
            .await?;
        Ok(actor_role)
    }

    async fn require_user_visibility(&self, actor: &UserIdentity, user_id: &str) -> AppResult<()> {
        if actor.subject() == user_id {
            return Ok(());
        }
        self.authorization_service
            .require_permission(actor.organization_id(), actor.subject(), Permission::ViewUsers)
            .await
    }
}

fn toggle_state(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

fn no_role(user_id: &str) -> AppError {
    AppError::NotFound(format!("user '{user_id}' holds no role in this organization"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use edsetu_core::AppError;
    use edsetu_domain::{AuditAction, Permission, RoleType};

    use super::PermissionBindingService;
    use crate::AuthorizationService;
    use crate::test_support::{FakeAccessStore, ManualClock, actor, seeded_store, start_time};

    fn service(store: &Arc<FakeAccessStore>) -> PermissionBindingService {
        PermissionBindingService::new(
            AuthorizationService::new(store.clone(), store.clone()),
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(ManualClock::new()),
        )
    }

    #[test]
    fn catalog_lists_every_permission() {
        let catalog = PermissionBindingService::list_permissions();
        assert_eq!(catalog.len(), Permission::all().len());
        assert!(catalog.iter().any(|entry| entry.permission == Permission::ViewAuditLog));
    }

    #[tokio::test]
    async fn override_on_one_sub_admin_does_not_leak_to_peers() {
        let (store, organization_id) = seeded_store().await;
        store.put_assignment(organization_id, "umar", RoleType::SubAdmin).await;
        store.put_assignment(organization_id, "vera", RoleType::SubAdmin).await;
        let service = service(&store);
        let admin = actor(organization_id, "alice");

        let effective = service
            .set_user_permission(&admin, "umar", "manage_students", true)
            .await
            .unwrap_or_else(|_| panic!("override"));
        assert!(effective.contains(&Permission::ManageStudents));

        let authorization = AuthorizationService::new(store.clone(), store.clone());
        assert!(matches!(
            authorization
                .can(organization_id, "umar", Permission::ManageStudents)
                .await,
            Ok(true)
        ));
        assert!(matches!(
            authorization
                .can(organization_id, "vera", Permission::ManageStudents)
                .await,
            Ok(false)
        ));

        let events = store.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, AuditAction::UserPermissionChanged);
        assert_eq!(events[0].previous_state.as_deref(), Some("disabled"));
    }

    #[tokio::test]
    async fn user_override_audit_records_effective_previous_value() {
        let (store, organization_id) = seeded_store().await;
        store.put_assignment(organization_id, "ivan", RoleType::Instructor).await;
        let service = service(&store);
        let admin = actor(organization_id, "alice");

        assert!(service
            .set_user_permission(&admin, "ivan", "create_course", false)
            .await
            .is_ok());
        assert!(service
            .set_user_permission(&admin, "ivan", "create_course", true)
            .await
            .is_ok());

        let events = store.events().await;
        let states: Vec<(Option<&str>, Option<&str>)> = events
            .iter()
            .map(|event| (event.previous_state.as_deref(), event.new_state.as_deref()))
            .collect();
        assert_eq!(
            states,
            vec![
                (Some("enabled"), Some("disabled")),
                (Some("disabled"), Some("enabled")),
            ]
        );
        assert!(events.iter().all(|event| event.occurred_at == start_time()));
    }

    #[tokio::test]
    async fn template_addition_is_inherited_without_explicit_override() {
        let (store, organization_id) = seeded_store().await;
        store.put_assignment(organization_id, "ivan", RoleType::Instructor).await;
        store.put_assignment(organization_id, "inez", RoleType::Instructor).await;
        let service = service(&store);
        let admin = actor(organization_id, "alice");

        assert!(service
            .set_user_permission(&admin, "inez", "delete_course", false)
            .await
            .is_ok());
        assert!(service
            .set_role_permission(&admin, "instructor", "delete_course", true)
            .await
            .is_ok());

        let ivan = service
            .effective_permissions_for_user(&admin, "ivan")
            .await
            .unwrap_or_else(|_| panic!("ivan"));
        let inez = service
            .effective_permissions_for_user(&admin, "inez")
            .await
            .unwrap_or_else(|_| panic!("inez"));
        assert!(ivan.contains(&Permission::DeleteCourse));
        assert!(!inez.contains(&Permission::DeleteCourse));
    }

    #[tokio::test]
    async fn enabling_manage_on_role_enables_implied_permissions() {
        let (store, organization_id) = seeded_store().await;
        let service = service(&store);
        let admin = actor(organization_id, "alice");

        let permissions = service
            .set_role_permission(&admin, "student", "manage_courses", true)
            .await
            .unwrap_or_else(|_| panic!("role toggle"));
        assert!(permissions.contains(&Permission::EditCourse));
        assert!(permissions.contains(&Permission::DeleteCourse));
    }

    #[tokio::test]
    async fn binding_edits_need_manage_roles_and_rank() {
        let (store, organization_id) = seeded_store().await;
        store.put_assignment(organization_id, "sam", RoleType::SubAdmin).await;
        let service = service(&store);
        let sub_admin = actor(organization_id, "sam");
        let admin = actor(organization_id, "alice");

        assert!(matches!(
            service
                .set_role_permission(&sub_admin, "student", "view_analytics", true)
                .await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service
                .set_role_permission(&admin, "admin", "view_analytics", false)
                .await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service
                .set_role_permission(&admin, "student", "teleport", true)
                .await,
            Err(AppError::UnknownPermission(_))
        ));
        assert!(matches!(
            service
                .set_user_permission(&admin, "nobody", "view_courses", true)
                .await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn reading_other_users_needs_view_users() {
        let (store, organization_id) = seeded_store().await;
        store.put_assignment(organization_id, "stu", RoleType::Student).await;
        let service = service(&store);
        let student = actor(organization_id, "stu");

        let own = service.effective_permissions_for_user(&student, "stu").await;
        assert!(matches!(own, Ok(ref permissions) if permissions == &vec![Permission::ViewCourses]));
        assert!(matches!(
            service.effective_permissions_for_user(&student, "alice").await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.user_overrides(&student, "stu").await,
            Ok(ref toggles) if toggles.is_empty()
        ));
    }
}
