//! Shared fakes for service tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use edsetu_core::{AppError, AppResult, OrganizationId, UserIdentity};
use edsetu_domain::{
    Invitation, InvitationContact, InvitationStatus, PermissionBinding, RoleType,
    default_binding_for_role,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    AssignmentQuery, AssignmentRepository, AuditEvent, AuditLogEntry, AuditLogQuery,
    AuditLogRepository, AuditRepository, Clock, InvitationNotice, InvitationNotifier,
    InvitationRepository, RoleRepository, UserRoleAssignment,
};

#[derive(Default)]
struct FakeState {
    roles: HashMap<(OrganizationId, RoleType), PermissionBinding>,
    assignments: HashMap<(OrganizationId, String), UserRoleAssignment>,
    overrides: HashMap<(OrganizationId, String), PermissionBinding>,
    invitations: HashMap<Uuid, Invitation>,
    events: Vec<AuditEvent>,
}

/// Single fake backing every repository port so atomic operations stay atomic.
#[derive(Default)]
pub(crate) struct FakeAccessStore {
    state: Mutex<FakeState>,
}

impl FakeAccessStore {
    pub(crate) async fn seed_defaults(&self, organization_id: OrganizationId) {
        let mut state = self.state.lock().await;
        for role in RoleType::all() {
            state
                .roles
                .insert((organization_id, *role), default_binding_for_role(*role));
        }
    }

    pub(crate) async fn put_assignment(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
        role: RoleType,
    ) {
        self.state.lock().await.assignments.insert(
            (organization_id, user_id.to_owned()),
            UserRoleAssignment {
                organization_id,
                user_id: user_id.to_owned(),
                role,
                assigned_by: "system".to_owned(),
                assigned_at: start_time(),
            },
        );
    }

    pub(crate) async fn events(&self) -> Vec<AuditEvent> {
        self.state.lock().await.events.clone()
    }

    pub(crate) async fn stored_invitation(&self, invitation_id: Uuid) -> Option<Invitation> {
        self.state
            .lock()
            .await
            .invitations
            .get(&invitation_id)
            .cloned()
    }

    pub(crate) async fn has_assignment(&self, organization_id: OrganizationId, user_id: &str) -> bool {
        self.state
            .lock()
            .await
            .assignments
            .contains_key(&(organization_id, user_id.to_owned()))
    }
}

#[async_trait]
impl RoleRepository for FakeAccessStore {
    async fn seed_roles(
        &self,
        organization_id: OrganizationId,
        roles: Vec<(RoleType, PermissionBinding)>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
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
            .lock()
            .await
            .roles
            .get(&(organization_id, role))
            .cloned())
    }

    async fn list_role_bindings(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<(RoleType, PermissionBinding)>> {
        let state = self.state.lock().await;
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
        self.state
            .lock()
            .await
            .roles
            .insert((organization_id, role), binding.clone());
        Ok(())
    }
}

#[async_trait]
impl AssignmentRepository for FakeAccessStore {
    async fn create_assignment(
        &self,
        assignment: UserRoleAssignment,
        overrides: PermissionBinding,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let key = (assignment.organization_id, assignment.user_id.clone());
        if state.assignments.contains_key(&key) {
            return Err(AppError::DuplicateAssignment(format!(
                "user '{}' already holds a role",
                assignment.user_id
            )));
        }
        if !overrides.is_empty() {
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
            .lock()
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
        let mut state = self.state.lock().await;
        let key = (organization_id, user_id.to_owned());
        state.overrides.remove(&key);
        state
            .assignments
            .remove(&key)
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' holds no role")))
    }

    async fn list_assignments(
        &self,
        organization_id: OrganizationId,
        query: AssignmentQuery,
    ) -> AppResult<Vec<UserRoleAssignment>> {
        let state = self.state.lock().await;
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
            .lock()
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
        self.state
            .lock()
            .await
            .overrides
            .insert((organization_id, user_id.to_owned()), overrides.clone());
        Ok(())
    }
}

#[async_trait]
impl InvitationRepository for FakeAccessStore {
    async fn insert_invitation(&self, invitation: &Invitation) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let conflict = state.invitations.values().any(|existing| {
            existing.organization_id() == invitation.organization_id()
                && existing.stored_status() == InvitationStatus::Pending
                && existing.contact().overlaps(invitation.contact())
        });
        if conflict {
            return Err(AppError::DuplicatePendingInvitation(
                "pending invitation exists".to_owned(),
            ));
        }
        state
            .invitations
            .insert(invitation.invitation_id(), invitation.clone());
        Ok(())
    }

    async fn find_invitation(&self, invitation_id: Uuid) -> AppResult<Option<Invitation>> {
        Ok(self.stored_invitation(invitation_id).await)
    }

    async fn update_invitation(
        &self,
        invitation: &Invitation,
        expected: InvitationStatus,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        match state.invitations.get_mut(&invitation.invitation_id()) {
            Some(stored) if stored.stored_status() == expected => {
                *stored = invitation.clone();
                Ok(())
            }
            Some(_) => Err(AppError::InvitationNotPending(
                "stored status changed".to_owned(),
            )),
            None => Err(AppError::NotFound("invitation not found".to_owned())),
        }
    }

    async fn accept_invitation(
        &self,
        invitation: &Invitation,
        assignment: UserRoleAssignment,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let key = (assignment.organization_id, assignment.user_id.clone());
        let stored_status = state
            .invitations
            .get(&invitation.invitation_id())
            .map(Invitation::stored_status);
        if stored_status != Some(InvitationStatus::Pending) {
            return Err(AppError::InvitationNotPending(
                "stored status changed".to_owned(),
            ));
        }
        if state.assignments.contains_key(&key) {
            return Err(AppError::DuplicateAssignment(
                "user already holds a role".to_owned(),
            ));
        }
        state.assignments.insert(key, assignment);
        state
            .invitations
            .insert(invitation.invitation_id(), invitation.clone());
        Ok(())
    }

    async fn find_pending_for_contact(
        &self,
        organization_id: OrganizationId,
        contact: &InvitationContact,
    ) -> AppResult<Vec<Invitation>> {
        Ok(self
            .state
            .lock()
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
        let state = self.state.lock().await;
        let mut invitations: Vec<Invitation> = state
            .invitations
            .values()
            .filter(|invitation| invitation.organization_id() == organization_id)
            .cloned()
            .collect();
        invitations.sort_by_key(|invitation| std::cmp::Reverse(invitation.created_at()));
        Ok(invitations)
    }

    async fn expire_stale(
        &self,
        organization_id: Option<OrganizationId>,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Invitation>> {
        let mut state = self.state.lock().await;
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
impl AuditRepository for FakeAccessStore {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.state.lock().await.events.push(event);
        Ok(())
    }
}

#[async_trait]
impl AuditLogRepository for FakeAccessStore {
    async fn list_recent_entries(
        &self,
        organization_id: OrganizationId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .events
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, event)| event.organization_id == organization_id)
            .skip(query.offset)
            .take(query.limit)
            .map(|(index, event)| AuditLogEntry {
                event_id: index.to_string(),
                subject: event.subject.clone(),
                action: event.action.as_str().to_owned(),
                resource_type: event.resource_type.clone(),
                resource_id: event.resource_id.clone(),
                previous_state: event.previous_state.clone(),
                new_state: event.new_state.clone(),
                detail: event.detail.clone(),
                created_at: event.occurred_at.to_rfc3339(),
            })
            .collect())
    }
}

/// Clock whose time only moves when a test advances it.
pub(crate) struct ManualClock {
    seconds: AtomicI64,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            seconds: AtomicI64::new(start_time().timestamp()),
        }
    }

    pub(crate) fn advance(&self, duration: Duration) {
        self.seconds
            .fetch_add(duration.num_seconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.seconds.load(Ordering::SeqCst), 0).unwrap_or_default()
    }
}

/// Notifier that records deliveries, or fails every delivery when `failing`.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub(crate) failing: bool,
    notices: Mutex<Vec<InvitationNotice>>,
}

impl RecordingNotifier {
    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            notices: Mutex::new(Vec::new()),
        }
    }

    pub(crate) async fn notices(&self) -> Vec<InvitationNotice> {
        self.notices.lock().await.clone()
    }
}

#[async_trait]
impl InvitationNotifier for RecordingNotifier {
    async fn send_invitation(&self, notice: &InvitationNotice) -> AppResult<()> {
        if self.failing {
            return Err(AppError::Internal("smtp relay unavailable".to_owned()));
        }
        self.notices.lock().await.push(notice.clone());
        Ok(())
    }
}

pub(crate) fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
        .single()
        .unwrap_or_default()
}

pub(crate) fn actor(organization_id: OrganizationId, subject: &str) -> UserIdentity {
    UserIdentity::new(subject, subject, None, organization_id)
}

/// Organization with default roles and an admin `alice`.
pub(crate) async fn seeded_store() -> (Arc<FakeAccessStore>, OrganizationId) {
    let store = Arc::new(FakeAccessStore::default());
    let organization_id = OrganizationId::new();
    store.seed_defaults(organization_id).await;
    store
        .put_assignment(organization_id, "alice", RoleType::Admin)
        .await;
    (store, organization_id)
}
