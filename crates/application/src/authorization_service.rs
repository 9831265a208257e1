use std::sync::Arc;

use edsetu_core::{AppError, AppResult, OrganizationId, UserIdentity};
use edsetu_domain::{Permission, PermissionBinding, RoleType};

use crate::{AssignmentRepository, RoleRepository};

/// Application service for organization-scoped authorization checks.
///
/// Every privilege decision in the workspace goes through this service:
/// permission lookups resolve the role-level binding overlaid with the
/// user's sparse overrides, and hierarchy checks defer to
/// [`RoleType::can_manage`].
#[derive(Clone)]
pub struct AuthorizationService {
    role_repository: Arc<dyn RoleRepository>,
    assignment_repository: Arc<dyn AssignmentRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from repository implementations.
    #[must_use]
    pub fn new(
        role_repository: Arc<dyn RoleRepository>,
        assignment_repository: Arc<dyn AssignmentRepository>,
    ) -> Self {
        Self {
            role_repository,
            assignment_repository,
        }
    }

    /// Returns the role a user holds in the organization.
    pub async fn role_of(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
    ) -> AppResult<Option<RoleType>> {
        Ok(self
            .assignment_repository
            .find_assignment(organization_id, user_id)
            .await?
            .map(|assignment| assignment.role))
    }

    /// Returns the role of the calling member, failing with `Forbidden` for non-members.
    pub async fn require_member(&self, actor: &UserIdentity) -> AppResult<RoleType> {
        self.role_of(actor.organization_id(), actor.subject())
            .await?
            .ok_or_else(|| {
                AppError::Forbidden(format!(
                    "subject '{}' holds no role in organization '{}'",
                    actor.subject(),
                    actor.organization_id()
                ))
            })
    }

    /// Returns the role-level binding of a seeded role.
    pub async fn role_binding(
        &self,
        organization_id: OrganizationId,
        role: RoleType,
    ) -> AppResult<PermissionBinding> {
        self.role_repository
            .find_role_binding(organization_id, role)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "role '{role}' does not exist in organization '{organization_id}'"
                ))
            })
    }

    /// Resolves the effective binding of a user, or `None` without an assignment.
    pub async fn effective_binding(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
    ) -> AppResult<Option<(RoleType, PermissionBinding)>> {
        let Some(role) = self.role_of(organization_id, user_id).await? else {
            return Ok(None);
        };

        let role_binding = self.role_binding(organization_id, role).await?;
        let overrides = self
            .assignment_repository
            .find_user_overrides(organization_id, user_id)
            .await?;

        Ok(Some((role, role_binding.overlay(&overrides))))
    }

    /// Returns whether the user may perform `permission`. Non-members are denied.
    pub async fn can(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
        permission: Permission,
    ) -> AppResult<bool> {
        Ok(self
            .effective_binding(organization_id, user_id)
            .await?
            .is_some_and(|(_, binding)| binding.allows(permission)))
    }

    /// Returns whether the role-level binding grants `permission`, ignoring overrides.
    pub async fn can_role(
        &self,
        organization_id: OrganizationId,
        role: RoleType,
        permission: Permission,
    ) -> AppResult<bool> {
        Ok(self
            .role_binding(organization_id, role)
            .await?
            .allows(permission))
    }

    /// Returns whether `actor_role` strictly outranks `target_role`.
    #[must_use]
    pub fn can_manage(actor_role: RoleType, target_role: RoleType) -> bool {
        actor_role.can_manage(target_role)
    }

    /// Ensures the user has the permission in the organization scope.
    pub async fn require_permission(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
        permission: Permission,
    ) -> AppResult<()> {
        if self.can(organization_id, user_id, permission).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "subject '{user_id}' is missing permission '{permission}' in organization '{organization_id}'"
        )))
    }

    /// Ensures an assigner may hand out or take away `target_role`.
    pub fn authorize_assignment(
        assigner_role: Option<RoleType>,
        target_role: RoleType,
    ) -> AppResult<()> {
        match assigner_role {
            Some(role) if Self::can_manage(role, target_role) => Ok(()),
            Some(role) => Err(AppError::AssignerNotAuthorized(format!(
                "role '{role}' cannot manage role '{target_role}'"
            ))),
            None => Err(AppError::AssignerNotAuthorized(format!(
                "assigner holds no role and cannot manage role '{target_role}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests;
