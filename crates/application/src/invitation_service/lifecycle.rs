use std::str::FromStr;

use edsetu_core::{AppError, AppResult, NonEmptyString, UserIdentity};
use edsetu_domain::{
    AuditAction, Invitation, InvitationContact, InvitationDraft, InvitationStatus, Permission,
    RoleType,
};
use tracing::info;
use uuid::Uuid;

use super::InvitationService;
use crate::{AuditEvent, AuthorizationService, CreateInvitationInput, UserRoleAssignment};

impl InvitationService {
    /// Issues a pending invitation and hands it to the notifier.
    ///
    /// A stored-pending invitation for the same contact that is already past
    /// its deadline is expired first and does not block the new one.
    pub async fn create_invitation(
        &self,
        actor: &UserIdentity,
        input: CreateInvitationInput,
    ) -> AppResult<Invitation> {
        let contact = InvitationContact::new(input.email.as_deref(), input.phone.as_deref())?;
        let role = RoleType::from_str(&input.role_name)?;
        let organization_id = actor.organization_id();
        self.authorization_service
            .role_binding(organization_id, role)
            .await?;

        let inviter_role = self
            .authorization_service
            .role_of(organization_id, actor.subject())
            .await?;
        AuthorizationService::authorize_assignment(inviter_role, role)?;
        let Some(inviter_role) = inviter_role else {
            return Err(AppError::AssignerNotAuthorized(
                "inviter holds no role".to_owned(),
            ));
        };
        self.authorization_service
            .require_permission(organization_id, actor.subject(), Permission::SendInvitations)
            .await?;

        let now = self.clock.now();
        for mut existing in self
            .invitation_repository
            .find_pending_for_contact(organization_id, &contact)
            .await?
        {
            if !existing.expire(now) {
                return Err(AppError::DuplicatePendingInvitation(format!(
                    "invitation '{}' is still pending for this contact",
                    existing.invitation_id()
                )));
            }
            self.persist_derived_expiry(&existing).await?;
        }

        let invitation = Invitation::issue(
            InvitationDraft {
                organization_id,
                contact,
                display_name: optional_text(input.display_name),
                role,
                invited_by: actor.subject().to_owned(),
                invited_by_name: actor.display_name().to_owned(),
                invited_by_role: inviter_role,
                message: optional_text(input.message),
            },
            now,
        )?;
        self.invitation_repository
            .insert_invitation(&invitation)
            .await?;

        self.record(
            &invitation,
            actor.subject(),
            AuditAction::InvitationCreated,
            InvitationStatus::Pending,
            Some(format!("invited as '{role}'")),
        )
        .await?;
        info!(
            invitation_id = %invitation.invitation_id(),
            %organization_id,
            %role,
            "invitation created"
        );

        self.notify(&invitation, false).await;
        Ok(invitation)
    }

    /// Accepts an invitation on behalf of `user_id` and grants the role.
    ///
    /// The inviter must still outrank the invited role. The status flip and
    /// the assignment insert commit together; on `DuplicateAssignment` or
    /// `AssignerNotAuthorized` the invitation stays pending.
    pub async fn accept_invitation(
        &self,
        invitation_id: Uuid,
        user_id: &str,
    ) -> AppResult<UserRoleAssignment> {
        let mut invitation = self.find_invitation(invitation_id).await?;
        let now = self.clock.now();

        if let Err(error) = invitation.accept(user_id, now) {
            if matches!(error, AppError::InvitationExpired(_)) {
                self.persist_derived_expiry(&invitation).await?;
            }
            return Err(error);
        }

        let inviter_role = self
            .authorization_service
            .role_of(invitation.organization_id(), invitation.invited_by())
            .await?;
        AuthorizationService::authorize_assignment(inviter_role, invitation.role())?;

        let assignment = UserRoleAssignment {
            organization_id: invitation.organization_id(),
            user_id: user_id.to_owned(),
            role: invitation.role(),
            assigned_by: invitation.invited_by().to_owned(),
            assigned_at: now,
        };
        self.invitation_repository
            .accept_invitation(&invitation, assignment.clone())
            .await?;

        self.record(
            &invitation,
            user_id,
            AuditAction::InvitationAccepted,
            InvitationStatus::Pending,
            None,
        )
        .await?;
        self.audit_repository
            .append_event(AuditEvent {
                organization_id: assignment.organization_id,
                subject: assignment.assigned_by.clone(),
                action: AuditAction::RoleAssigned,
                resource_type: "user_role".to_owned(),
                resource_id: user_id.to_owned(),
                previous_state: None,
                new_state: Some(assignment.role.as_str().to_owned()),
                detail: Some(format!("accepted invitation '{invitation_id}'")),
                occurred_at: now,
            })
            .await?;

        info!(%invitation_id, user_id, role = %assignment.role, "invitation accepted");
        Ok(assignment)
    }

    /// Withdraws a pending invitation.
    pub async fn revoke_invitation(
        &self,
        actor: &UserIdentity,
        invitation_id: Uuid,
    ) -> AppResult<Invitation> {
        let mut invitation = self.find_managed_invitation(actor, invitation_id).await?;
        let previous = invitation.stored_status();
        let now = self.clock.now();

        if let Err(error) = invitation.revoke(now) {
            self.persist_if_expired(&invitation, previous).await?;
            return Err(error);
        }
        self.invitation_repository
            .update_invitation(&invitation, InvitationStatus::Pending)
            .await?;

        self.record(
            &invitation,
            actor.subject(),
            AuditAction::InvitationRevoked,
            InvitationStatus::Pending,
            None,
        )
        .await?;
        info!(%invitation_id, "invitation revoked");
        Ok(invitation)
    }

    /// Restarts the acceptance window and delivers the invitation again.
    pub async fn resend_invitation(
        &self,
        actor: &UserIdentity,
        invitation_id: Uuid,
    ) -> AppResult<Invitation> {
        let mut invitation = self.find_managed_invitation(actor, invitation_id).await?;
        let previous = invitation.stored_status();
        let now = self.clock.now();

        if let Err(error) = invitation.resend(now) {
            self.persist_if_expired(&invitation, previous).await?;
            return Err(error);
        }
        self.invitation_repository
            .update_invitation(&invitation, InvitationStatus::Pending)
            .await?;

        self.record(
            &invitation,
            actor.subject(),
            AuditAction::InvitationResent,
            InvitationStatus::Pending,
            Some(format!("expires at {}", invitation.expires_at().to_rfc3339())),
        )
        .await?;
        info!(%invitation_id, "invitation resent");

        self.notify(&invitation, true).await;
        Ok(invitation)
    }

    /// Persists `expired` when a failed transition was caused by derived expiry.
    async fn persist_if_expired(
        &self,
        invitation: &Invitation,
        previous: InvitationStatus,
    ) -> AppResult<()> {
        if previous == InvitationStatus::Pending
            && invitation.stored_status() == InvitationStatus::Expired
        {
            self.persist_derived_expiry(invitation).await?;
        }
        Ok(())
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .and_then(|value| NonEmptyString::new(value.trim()).ok())
        .map(String::from)
}
