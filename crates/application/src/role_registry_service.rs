use std::str::FromStr;
use std::sync::Arc;

use edsetu_core::{AppError, AppResult, OrganizationId};
use edsetu_domain::{AuditAction, PermissionBinding, RoleType, default_binding_for_role};
use tracing::info;

use crate::{
    AssignmentRepository, AuditEvent, AuditRepository, Clock, RoleDefinition, RoleRepository,
    UserRoleAssignment,
};

/// Subject recorded for assignments made during provisioning.
pub const SYSTEM_SUBJECT: &str = "system";

/// Application service for the per-organization role catalog.
#[derive(Clone)]
pub struct RoleRegistryService {
    role_repository: Arc<dyn RoleRepository>,
    assignment_repository: Arc<dyn AssignmentRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    clock: Arc<dyn Clock>,
}

impl RoleRegistryService {
    /// Creates a new role registry service.
    #[must_use]
    pub fn new(
        role_repository: Arc<dyn RoleRepository>,
        assignment_repository: Arc<dyn AssignmentRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            role_repository,
            assignment_repository,
            audit_repository,
            clock,
        }
    }

    /// Seeds the default roles and makes `owner_user_id` the organization admin.
    ///
    /// Seeding never overwrites an existing binding. Fails with
    /// `DuplicateAssignment` when the owner already holds a role.
    pub async fn provision_organization(
        &self,
        organization_id: OrganizationId,
        owner_user_id: &str,
    ) -> AppResult<UserRoleAssignment> {
        let defaults = RoleType::all()
            .iter()
            .map(|role| (*role, default_binding_for_role(*role)))
            .collect();
        self.role_repository
            .seed_roles(organization_id, defaults)
            .await?;

        let assignment = UserRoleAssignment {
            organization_id,
            user_id: owner_user_id.to_owned(),
            role: RoleType::Admin,
            assigned_by: SYSTEM_SUBJECT.to_owned(),
            assigned_at: self.clock.now(),
        };
        self.assignment_repository
            .create_assignment(assignment.clone(), PermissionBinding::new())
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                organization_id,
                subject: SYSTEM_SUBJECT.to_owned(),
                action: AuditAction::OrganizationProvisioned,
                resource_type: "organization".to_owned(),
                resource_id: organization_id.to_string(),
                previous_state: None,
                new_state: Some(format!("{owner_user_id}:{}", RoleType::Admin)),
                detail: Some(format!("provisioned organization owned by '{owner_user_id}'")),
                occurred_at: assignment.assigned_at,
            })
            .await?;

        info!(%organization_id, owner = owner_user_id, "organization provisioned");
        Ok(assignment)
    }

    /// Returns one role of the organization registry.
    pub async fn get_role(
        &self,
        organization_id: OrganizationId,
        role_name: &str,
    ) -> AppResult<RoleDefinition> {
        let role = RoleType::from_str(role_name)?;
        let binding = self
            .role_repository
            .find_role_binding(organization_id, role)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "role '{role}' does not exist in organization '{organization_id}'"
                ))
            })?;

        Ok(role_definition(organization_id, role, &binding))
    }

    /// Lists the organization roles by descending rank.
    pub async fn list_roles(&self, organization_id: OrganizationId) -> AppResult<Vec<RoleDefinition>> {
        let mut roles: Vec<RoleDefinition> = self
            .role_repository
            .list_role_bindings(organization_id)
            .await?
            .iter()
            .map(|(role, binding)| role_definition(organization_id, *role, binding))
            .collect();
        roles.sort_by(|left, right| right.rank.cmp(&left.rank));
        Ok(roles)
    }

    /// Returns the hierarchy rank of a role name.
    pub fn rank(role_name: &str) -> AppResult<i32> {
        Ok(RoleType::from_str(role_name)?.rank())
    }
}

pub(crate) fn role_definition(
    organization_id: OrganizationId,
    role: RoleType,
    binding: &PermissionBinding,
) -> RoleDefinition {
    RoleDefinition {
        organization_id,
        role,
        display_name: role.display_name().to_owned(),
        description: role.description().to_owned(),
        rank: role.rank(),
        permissions: binding.enabled(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use edsetu_core::{AppError, OrganizationId};
    use edsetu_domain::{AuditAction, Permission, RoleType};

    use super::RoleRegistryService;
    use crate::test_support::{FakeAccessStore, ManualClock};

    fn service(store: &Arc<FakeAccessStore>) -> RoleRegistryService {
        RoleRegistryService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(ManualClock::new()),
        )
    }

    #[tokio::test]
    async fn provisioning_seeds_roles_and_owner() {
        let store = Arc::new(FakeAccessStore::default());
        let service = service(&store);
        let organization_id = OrganizationId::new();

        let assignment = service
            .provision_organization(organization_id, "alice")
            .await
            .unwrap_or_else(|_| panic!("provision"));
        assert_eq!(assignment.role, RoleType::Admin);
        assert_eq!(assignment.assigned_by, "system");

        let roles = service
            .list_roles(organization_id)
            .await
            .unwrap_or_else(|_| panic!("list roles"));
        let ranks: Vec<i32> = roles.iter().map(|role| role.rank).collect();
        assert_eq!(ranks, vec![4, 3, 2, 1]);

        let events = store.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, AuditAction::OrganizationProvisioned);
    }

    #[tokio::test]
    async fn provisioning_twice_for_same_owner_is_duplicate() {
        let store = Arc::new(FakeAccessStore::default());
        let service = service(&store);
        let organization_id = OrganizationId::new();

        assert!(service.provision_organization(organization_id, "alice").await.is_ok());
        let result = service.provision_organization(organization_id, "alice").await;
        assert!(matches!(result, Err(AppError::DuplicateAssignment(_))));
    }

    #[tokio::test]
    async fn get_role_returns_seeded_permissions() {
        let store = Arc::new(FakeAccessStore::default());
        let service = service(&store);
        let organization_id = OrganizationId::new();
        assert!(service.provision_organization(organization_id, "alice").await.is_ok());

        let role = service
            .get_role(organization_id, "instructor")
            .await
            .unwrap_or_else(|_| panic!("instructor role"));
        assert_eq!(role.display_name, "Instructor");
        assert!(role.permissions.contains(&Permission::CreateCourse));
        assert!(!role.permissions.contains(&Permission::ManageUsers));
    }

    #[tokio::test]
    async fn unknown_or_unseeded_roles_are_not_found() {
        let store = Arc::new(FakeAccessStore::default());
        let service = service(&store);
        let organization_id = OrganizationId::new();

        assert!(matches!(
            service.get_role(organization_id, "owner").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.get_role(organization_id, "admin").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            RoleRegistryService::rank("janitor"),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(RoleRegistryService::rank("sub_admin"), Ok(3)));
    }
}
