use std::str::FromStr;
use std::sync::Arc;

use edsetu_core::{AppError, AppResult, OrganizationId, UserIdentity};
use edsetu_domain::{AuditAction, Permission, PermissionBinding, RoleType};
use tracing::info;

use crate::{
    AssignRoleInput, AssignmentQuery, AssignmentRepository, AuditEvent, AuditRepository,
    AuthorizationService, Clock, UserRoleAssignment,
};

/// Application service for direct role assignment and revocation.
#[derive(Clone)]
pub struct RoleAssignmentService {
    authorization_service: AuthorizationService,
    assignment_repository: Arc<dyn AssignmentRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    clock: Arc<dyn Clock>,
}

impl RoleAssignmentService {
    /// Creates a new role assignment service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        assignment_repository: Arc<dyn AssignmentRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            authorization_service,
            assignment_repository,
            audit_repository,
            clock,
        }
    }

    /// Grants a role to a user in the actor's organization.
    ///
    /// Checks run in this order: role lookup (`NotFound`), hierarchy
    /// (`AssignerNotAuthorized`), management permission (`Forbidden`), then
    /// the storage uniqueness constraint (`DuplicateAssignment`).
    pub async fn assign_role(
        &self,
        actor: &UserIdentity,
        input: AssignRoleInput,
    ) -> AppResult<UserRoleAssignment> {
        let organization_id = actor.organization_id();
        let role = RoleType::from_str(&input.role_name)?;
        self.authorization_service
            .role_binding(organization_id, role)
            .await?;

        self.authorize_management(actor, role).await?;

        let mut overrides = PermissionBinding::new();
        if !input.permission_overrides.is_empty() {
            self.authorization_service
                .require_permission(organization_id, actor.subject(), Permission::ManageRoles)
                .await?;
            for toggle in &input.permission_overrides {
                overrides.set(toggle.permission, toggle.enabled);
            }
        }

        let assignment = UserRoleAssignment {
            organization_id,
            user_id: input.user_id,
            role,
            assigned_by: actor.subject().to_owned(),
            assigned_at: self.clock.now(),
        };
        self.assignment_repository
            .create_assignment(assignment.clone(), overrides)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                organization_id,
                subject: actor.subject().to_owned(),
                action: AuditAction::RoleAssigned,
                resource_type: "user_role".to_owned(),
                resource_id: assignment.user_id.clone(),
                previous_state: None,
                new_state: Some(role.as_str().to_owned()),
                detail: Some(format!(
                    "assigned role '{role}' to '{}'",
                    assignment.user_id
                )),
                occurred_at: assignment.assigned_at,
            })
            .await?;

        info!(%organization_id, user_id = %assignment.user_id, %role, "role assigned");
        Ok(assignment)
    }

    /// Removes the role of a user together with the user's overrides.
    pub async fn revoke_role(
        &self,
        actor: &UserIdentity,
        user_id: &str,
    ) -> AppResult<UserRoleAssignment> {
        let organization_id = actor.organization_id();
        let held = self
            .assignment_repository
            .find_assignment(organization_id, user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("user '{user_id}' holds no role in this organization"))
            })?;

        self.authorize_management(actor, held.role).await?;

        let removed = self
            .assignment_repository
            .delete_assignment(organization_id, user_id)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                organization_id,
                subject: actor.subject().to_owned(),
                action: AuditAction::RoleRevoked,
                resource_type: "user_role".to_owned(),
                resource_id: user_id.to_owned(),
                previous_state: Some(removed.role.as_str().to_owned()),
                new_state: None,
                detail: Some(format!("revoked role '{}' from '{user_id}'", removed.role)),
                occurred_at: self.clock.now(),
            })
            .await?;

        info!(%organization_id, user_id, role = %removed.role, "role revoked");
        Ok(removed)
    }

    /// Returns the active assignment of a user.
    pub async fn role_for_user(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
    ) -> AppResult<Option<UserRoleAssignment>> {
        self.assignment_repository
            .find_assignment(organization_id, user_id)
            .await
    }

    /// Returns one user's assignment when the actor may see it.
    ///
    /// Visibility follows [`Self::list_assignments`]: the actor's own row or a
    /// row whose role the actor strictly outranks. Other rows are `Forbidden`.
    pub async fn visible_assignment(
        &self,
        actor: &UserIdentity,
        user_id: &str,
    ) -> AppResult<UserRoleAssignment> {
        let actor_role = self.authorization_service.require_member(actor).await?;
        let assignment = self
            .assignment_repository
            .find_assignment(actor.organization_id(), user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("user '{user_id}' holds no role in this organization"))
            })?;

        if assignment.user_id != actor.subject()
            && !AuthorizationService::can_manage(actor_role, assignment.role)
        {
            return Err(AppError::Forbidden(format!(
                "role '{actor_role}' cannot view a '{}' member",
                assignment.role
            )));
        }
        Ok(assignment)
    }

    /// Lists the assignments visible to the actor.
    ///
    /// A member sees their own row plus every assignment whose role they
    /// strictly outrank.
    pub async fn list_assignments(
        &self,
        actor: &UserIdentity,
        query: AssignmentQuery,
    ) -> AppResult<Vec<UserRoleAssignment>> {
        let actor_role = self.authorization_service.require_member(actor).await?;

        Ok(self
            .assignment_repository
            .list_assignments(actor.organization_id(), query)
            .await?
            .into_iter()
            .filter(|assignment| {
                assignment.user_id == actor.subject()
                    || AuthorizationService::can_manage(actor_role, assignment.role)
            })
            .collect())
    }

    async fn authorize_management(&self, actor: &UserIdentity, target_role: RoleType) -> AppResult<()> {
        let assigner_role = self
            .authorization_service
            .role_of(actor.organization_id(), actor.subject())
            .await?;
        AuthorizationService::authorize_assignment(assigner_role, target_role)?;

        match target_role.management_permission() {
            Some(permission) => {
                self.authorization_service
                    .require_permission(actor.organization_id(), actor.subject(), permission)
                    .await
            }
            None => Err(AppError::Forbidden(format!(
                "role '{target_role}' is only granted by organization provisioning"
            ))),
        }
    }
}
