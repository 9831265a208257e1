use async_trait::async_trait;
use chrono::{DateTime, Utc};
use edsetu_core::{AppResult, OrganizationId};
use edsetu_domain::{Invitation, InvitationContact, InvitationStatus, PermissionBinding, RoleType};
use uuid::Uuid;

use super::audit::{AuditEvent, AuditLogEntry, AuditLogQuery};
use super::roles::{AssignmentQuery, UserRoleAssignment};

/// Repository port for the organization role registry.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Inserts the listed roles that do not exist yet; existing bindings are kept.
    async fn seed_roles(
        &self,
        organization_id: OrganizationId,
        roles: Vec<(RoleType, PermissionBinding)>,
    ) -> AppResult<()>;

    /// Returns the role-level binding, if the role exists in the organization.
    async fn find_role_binding(
        &self,
        organization_id: OrganizationId,
        role: RoleType,
    ) -> AppResult<Option<PermissionBinding>>;

    /// Lists every seeded role with its binding.
    async fn list_role_bindings(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<(RoleType, PermissionBinding)>>;

    /// Replaces the role-level binding.
    async fn save_role_binding(
        &self,
        organization_id: OrganizationId,
        role: RoleType,
        binding: &PermissionBinding,
    ) -> AppResult<()>;
}

/// Repository port for user-role assignments and per-user overrides.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Creates an assignment together with its overrides.
    ///
    /// Fails with `DuplicateAssignment` when the user already holds a role in
    /// the organization; nothing is written in that case.
    async fn create_assignment(
        &self,
        assignment: UserRoleAssignment,
        overrides: PermissionBinding,
    ) -> AppResult<()>;

    /// Finds the active assignment of a user.
    async fn find_assignment(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
    ) -> AppResult<Option<UserRoleAssignment>>;

    /// Deletes an assignment and the user's overrides, returning the removed row.
    async fn delete_assignment(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
    ) -> AppResult<UserRoleAssignment>;

    /// Lists assignments ordered by user id.
    async fn list_assignments(
        &self,
        organization_id: OrganizationId,
        query: AssignmentQuery,
    ) -> AppResult<Vec<UserRoleAssignment>>;

    /// Returns the sparse overrides of a user; empty when none are stored.
    async fn find_user_overrides(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
    ) -> AppResult<PermissionBinding>;

    /// Replaces the overrides of a user.
    async fn save_user_overrides(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
        overrides: &PermissionBinding,
    ) -> AppResult<()>;
}

/// Repository port for invitations.
#[async_trait]
pub trait InvitationRepository: Send + Sync {
    /// Persists a new pending invitation.
    ///
    /// Fails with `DuplicatePendingInvitation` when a stored-pending
    /// invitation in the same organization shares its email or phone.
    async fn insert_invitation(&self, invitation: &Invitation) -> AppResult<()>;

    /// Finds an invitation by id.
    async fn find_invitation(&self, invitation_id: Uuid) -> AppResult<Option<Invitation>>;

    /// Writes a transitioned invitation if its stored status still equals `expected`.
    ///
    /// A mismatch fails with `InvitationNotPending`.
    async fn update_invitation(
        &self,
        invitation: &Invitation,
        expected: InvitationStatus,
    ) -> AppResult<()>;

    /// Flips a pending invitation to accepted and inserts the assignment atomically.
    ///
    /// Fails with `InvitationNotPending` when the stored status is no longer
    /// pending and with `DuplicateAssignment` when the user already holds a
    /// role. Neither write is kept on failure.
    async fn accept_invitation(
        &self,
        invitation: &Invitation,
        assignment: UserRoleAssignment,
    ) -> AppResult<()>;

    /// Lists stored-pending invitations sharing an email or phone with `contact`.
    async fn find_pending_for_contact(
        &self,
        organization_id: OrganizationId,
        contact: &InvitationContact,
    ) -> AppResult<Vec<Invitation>>;

    /// Lists organization invitations newest first.
    async fn list_invitations(&self, organization_id: OrganizationId)
    -> AppResult<Vec<Invitation>>;

    /// Moves stored-pending invitations past their deadline to expired.
    ///
    /// Returns the transitioned invitations.
    async fn expire_stale(
        &self,
        organization_id: Option<OrganizationId>,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Invitation>>;
}

/// Repository port for append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Appends one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}

/// Repository port for audit log reads.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Lists recent organization audit entries, newest first.
    async fn list_recent_entries(
        &self,
        organization_id: OrganizationId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>>;
}
