use std::sync::Arc;

use edsetu_core::{AppError, AppResult, UserIdentity};
use edsetu_domain::{AuditAction, Invitation, InvitationStatus, Permission, RoleType};
use tracing::warn;
use uuid::Uuid;

use crate::{
    AuditEvent, AuditRepository, AuthorizationService, Clock, InvitationNotice,
    InvitationNotifier, InvitationRepository,
};

mod lifecycle;
mod queries;

/// Application service for the invitation workflow.
#[derive(Clone)]
pub struct InvitationService {
    authorization_service: AuthorizationService,
    invitation_repository: Arc<dyn InvitationRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    notifier: Arc<dyn InvitationNotifier>,
    clock: Arc<dyn Clock>,
}

impl InvitationService {
    /// Creates a new invitation service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        invitation_repository: Arc<dyn InvitationRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        notifier: Arc<dyn InvitationNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            authorization_service,
            invitation_repository,
            audit_repository,
            notifier,
            clock,
        }
    }

    async fn find_invitation(&self, invitation_id: Uuid) -> AppResult<Invitation> {
        self.invitation_repository
            .find_invitation(invitation_id)
            .await?
            .ok_or_else(|| not_found(invitation_id))
    }

    /// Loads an invitation the actor may revoke or resend.
    async fn find_managed_invitation(
        &self,
        actor: &UserIdentity,
        invitation_id: Uuid,
    ) -> AppResult<Invitation> {
        let invitation = self.find_invitation(invitation_id).await?;
        if invitation.organization_id() != actor.organization_id() {
            return Err(not_found(invitation_id));
        }

        let actor_role = self
            .authorization_service
            .role_of(actor.organization_id(), actor.subject())
            .await?;
        AuthorizationService::authorize_assignment(actor_role, invitation.role())?;

        if invitation.invited_by() != actor.subject() {
            self.authorization_service
                .require_permission(
                    actor.organization_id(),
                    actor.subject(),
                    Permission::ManageInvitations,
                )
                .await?;
        }

        Ok(invitation)
    }

    /// Returns the actor's role when they may read invitation lists.
    async fn require_invitation_reader(&self, actor: &UserIdentity) -> AppResult<RoleType> {
        let actor_role = self.authorization_service.require_member(actor).await?;
        let organization_id = actor.organization_id();
        for permission in [Permission::SendInvitations, Permission::ManageInvitations] {
            if self
                .authorization_service
                .can(organization_id, actor.subject(), permission)
                .await?
            {
                return Ok(actor_role);
            }
        }

        Err(AppError::Forbidden(format!(
            "subject '{}' cannot view invitations",
            actor.subject()
        )))
    }

    /// Writes derived expiry discovered during a failed transition.
    async fn persist_derived_expiry(&self, invitation: &Invitation) -> AppResult<()> {
        self.invitation_repository
            .update_invitation(invitation, InvitationStatus::Pending)
            .await?;
        self.record(
            invitation,
            crate::SYSTEM_SUBJECT,
            AuditAction::InvitationExpired,
            InvitationStatus::Pending,
            None,
        )
        .await
    }

    async fn record(
        &self,
        invitation: &Invitation,
        subject: &str,
        action: AuditAction,
        previous: InvitationStatus,
        detail: Option<String>,
    ) -> AppResult<()> {
        let previous_state = match action {
            AuditAction::InvitationCreated => None,
            _ => Some(previous.as_str().to_owned()),
        };

        self.audit_repository
            .append_event(AuditEvent {
                organization_id: invitation.organization_id(),
                subject: subject.to_owned(),
                action,
                resource_type: "invitation".to_owned(),
                resource_id: invitation.invitation_id().to_string(),
                previous_state,
                new_state: Some(invitation.stored_status().as_str().to_owned()),
                detail,
                occurred_at: self.clock.now(),
            })
            .await
    }

    /// Delivery failures never undo the invitation.
    async fn notify(&self, invitation: &Invitation, is_resend: bool) {
        let notice = InvitationNotice::for_invitation(invitation, is_resend);
        if let Err(error) = self.notifier.send_invitation(&notice).await {
            warn!(
                invitation_id = %notice.invitation_id,
                organization_id = %notice.organization_id,
                error = %error,
                "invitation notification failed"
            );
        }
    }
}

fn not_found(invitation_id: Uuid) -> AppError {
    AppError::NotFound(format!("invitation '{invitation_id}' was not found"))
}
