use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use edsetu_application::{
    AssignmentQuery, AssignmentRepository, AuditEvent, AuditLogEntry, AuditLogQuery,
    AuditLogRepository, AuditRepository, InvitationRepository, RoleRepository, UserRoleAssignment,
};
use edsetu_core::{AppError, AppResult, OrganizationId};
use edsetu_domain::{Invitation, InvitationContact, InvitationStatus, PermissionBinding, RoleType};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct AccessState {
    roles: HashMap<(OrganizationId, RoleType), PermissionBinding>,
    assignments: HashMap<(OrganizationId, String), UserRoleAssignment>,
    overrides: HashMap<(OrganizationId, String), PermissionBinding>,
    invitations: HashMap<Uuid, Invitation>,
    audit_entries: Vec<(OrganizationId, AuditLogEntry)>,
}

/// In-memory implementation of every access-control port.
///
/// All maps sit behind one lock so that accepting an invitation and
/// inserting the resulting assignment commit as a single step.
#[derive(Debug, Default)]
pub struct InMemoryAccessRepository {
    state: RwLock<AccessState>,
}

impl InMemoryAccessRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn duplicate_assignment(assignment: &UserRoleAssignment) -> AppError {
    AppError::DuplicateAssignment(format!(
        "user '{}' already holds a role in organization '{}'",
        assignment.user_id, assignment.organization_id
    ))
}

fn not_pending(invitation_id: Uuid) -> AppError {
    AppError::InvitationNotPending(format!("invitation '{invitation_id}' is no longer pending"))
}

#[async_trait]
impl RoleRepository for InMemoryAccessRepository {
    async fn seed_roles(
        &self,
        organization_id: OrganizationId,
        roles: Vec<(RoleType, PermissionBinding)>,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        for (role, binding) in roles {
            state.roles.entry((organization_id, role)).or_insert(binding);
        }
        Ok(())
    }

    async fn find_role_binding(
        &self,
        organization_id: OrganizationId,
        role: RoleType,
    ) -> AppResult<Option<PermissionBinding>> {
        Ok(self
            .state
            .read()
            .await
            .roles
            .get(&(organization_id, role))
            .cloned())
    }

    async fn list_role_bindings(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<(RoleType, PermissionBinding)>> {
        let state = self.state.read().await;
        Ok(RoleType::all()
            .iter()
            .filter_map(|role| {
                state
                    .roles
                    .get(&(organization_id, *role))
                    .map(|binding| (*role, binding.clone()))
            })
            .collect())
    }

    async fn save_role_binding(
        &self,
        organization_id: OrganizationId,
        role: RoleType,
        binding: &PermissionBinding,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        let Some(stored) = state.roles.get_mut(&(organization_id, role)) else {
            return Err(AppError::NotFound(format!(
                "role '{role}' does not exist in organization '{organization_id}'"
            )));
        };
        *stored = binding.clone();
        Ok(())
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryAccessRepository {
    async fn create_assignment(
        &self,
        assignment: UserRoleAssignment,
        overrides: PermissionBinding,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        let key = (assignment.organization_id, assignment.user_id.clone());
        if state.assignments.contains_key(&key) {
            return Err(duplicate_assignment(&assignment));
        }

        if overrides.is_empty() {
            state.overrides.remove(&key);
        } else {
            state.overrides.insert(key.clone(), overrides);
        }
        state.assignments.insert(key, assignment);
        Ok(())
    }

    async fn find_assignment(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
    ) -> AppResult<Option<UserRoleAssignment>> {
        Ok(self
            .state
            .read()
            .await
            .assignments
            .get(&(organization_id, user_id.to_owned()))
            .cloned())
    }

    async fn delete_assignment(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
    ) -> AppResult<UserRoleAssignment> {
        let mut state = self.state.write().await;
        let key = (organization_id, user_id.to_owned());
        let removed = state.assignments.remove(&key).ok_or_else(|| {
            AppError::NotFound(format!(
                "user '{user_id}' holds no role in organization '{organization_id}'"
            ))
        })?;
        state.overrides.remove(&key);
        Ok(removed)
    }

    async fn list_assignments(
        &self,
        organization_id: OrganizationId,
        query: AssignmentQuery,
    ) -> AppResult<Vec<UserRoleAssignment>> {
        let state = self.state.read().await;
        let mut assignments: Vec<UserRoleAssignment> = state
            .assignments
            .values()
            .filter(|assignment| assignment.organization_id == organization_id)
            .filter(|assignment| query.role.is_none_or(|role| assignment.role == role))
            .cloned()
            .collect();
        assignments.sort_by(|left, right| left.user_id.cmp(&right.user_id));
        Ok(assignments)
    }

    async fn find_user_overrides(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
    ) -> AppResult<PermissionBinding> {
        Ok(self
            .state
            .read()
            .await
            .overrides
            .get(&(organization_id, user_id.to_owned()))
            .cloned()
            .unwrap_or_default())
    }

    async fn save_user_overrides(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
        overrides: &PermissionBinding,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        let key = (organization_id, user_id.to_owned());
        if !state.assignments.contains_key(&key) {
            return Err(AppError::NotFound(format!(
                "user '{user_id}' holds no role in organization '{organization_id}'"
            )));
        }
        state.overrides.insert(key, overrides.clone());
        Ok(())
    }
}

#[async_trait]
impl InvitationRepository for InMemoryAccessRepository {
    async fn insert_invitation(&self, invitation: &Invitation) -> AppResult<()> {
        let mut state = self.state.write().await;
        let conflict = state.invitations.values().any(|existing| {
            existing.organization_id() == invitation.organization_id()
                && existing.stored_status() == InvitationStatus::Pending
                && existing.contact().overlaps(invitation.contact())
        });
        if conflict {
            return Err(AppError::DuplicatePendingInvitation(format!(
                "a pending invitation already exists for this contact in organization '{}'",
                invitation.organization_id()
            )));
        }

        state
            .invitations
            .insert(invitation.invitation_id(), invitation.clone());
        Ok(())
    }

    async fn find_invitation(&self, invitation_id: Uuid) -> AppResult<Option<Invitation>> {
        Ok(self
            .state
            .read()
            .await
            .invitations
            .get(&invitation_id)
            .cloned())
    }

    async fn update_invitation(
        &self,
        invitation: &Invitation,
        expected: InvitationStatus,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        let invitation_id = invitation.invitation_id();
        let stored = state.invitations.get_mut(&invitation_id).ok_or_else(|| {
            AppError::NotFound(format!("invitation '{invitation_id}' was not found"))
        })?;
        if stored.stored_status() != expected {
            return Err(not_pending(invitation_id));
        }

        *stored = invitation.clone();
        Ok(())
    }

    async fn accept_invitation(
        &self,
        invitation: &Invitation,
        assignment: UserRoleAssignment,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        let invitation_id = invitation.invitation_id();
        let still_pending = state
            .invitations
            .get(&invitation_id)
            .is_some_and(|stored| stored.stored_status() == InvitationStatus::Pending);
        if !still_pending {
            return Err(not_pending(invitation_id));
        }

        let key = (assignment.organization_id, assignment.user_id.clone());
        if state.assignments.contains_key(&key) {
            return Err(duplicate_assignment(&assignment));
        }

        state.assignments.insert(key, assignment);
        state.invitations.insert(invitation_id, invitation.clone());
        Ok(())
    }

    async fn find_pending_for_contact(
        &self,
        organization_id: OrganizationId,
        contact: &InvitationContact,
    ) -> AppResult<Vec<Invitation>> {
        Ok(self
            .state
            .read()
            .await
            .invitations
            .values()
            .filter(|invitation| {
                invitation.organization_id() == organization_id
                    && invitation.stored_status() == InvitationStatus::Pending
                    && invitation.contact().overlaps(contact)
            })
            .cloned()
            .collect())
    }

    async fn list_invitations(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<Invitation>> {
        let state = self.state.read().await;
        let mut invitations: Vec<Invitation> = state
            .invitations
            .values()
            .filter(|invitation| invitation.organization_id() == organization_id)
            .cloned()
            .collect();
        invitations.sort_by(|left, right| {
            right
                .created_at()
                .cmp(&left.created_at())
                .then_with(|| left.invitation_id().cmp(&right.invitation_id()))
        });
        Ok(invitations)
    }

    async fn expire_stale(
        &self,
        organization_id: Option<OrganizationId>,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Invitation>> {
        let mut state = self.state.write().await;
        let mut expired = Vec::new();
        for invitation in state.invitations.values_mut() {
            if organization_id.is_some_and(|scope| scope != invitation.organization_id()) {
                continue;
            }
            if invitation.expire(now) {
                expired.push(invitation.clone());
            }
        }
        Ok(expired)
    }
}

#[async_trait]
impl AuditRepository for InMemoryAccessRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        let entry = AuditLogEntry {
            event_id: Uuid::new_v4().to_string(),
            subject: event.subject,
            action: event.action.as_str().to_owned(),
            resource_type: event.resource_type,
            resource_id: event.resource_id,
            previous_state: event.previous_state,
            new_state: event.new_state,
            detail: event.detail,
            created_at: event.occurred_at.to_rfc3339(),
        };
        self.state
            .write()
            .await
            .audit_entries
            .push((event.organization_id, entry));
        Ok(())
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAccessRepository {
    async fn list_recent_entries(
        &self,
        organization_id: OrganizationId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        let state = self.state.read().await;
        Ok(state
            .audit_entries
            .iter()
            .rev()
            .filter(|(scope, _)| *scope == organization_id)
            .map(|(_, entry)| entry)
            .filter(|entry| {
                query
                    .action
                    .as_deref()
                    .is_none_or(|action| entry.action == action)
            })
            .filter(|entry| {
                query
                    .subject
                    .as_deref()
                    .is_none_or(|subject| entry.subject == subject)
            })
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }
}
