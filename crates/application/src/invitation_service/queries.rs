use std::collections::BTreeMap;

use edsetu_core::{AppResult, OrganizationId, UserIdentity};
use edsetu_domain::{AuditAction, Invitation, InvitationStatus, RoleType};
use tracing::info;

use super::InvitationService;
use crate::{AuthorizationService, InvitationQuery};

impl InvitationService {
    /// Lists invitations for roles the actor outranks, newest first.
    ///
    /// The status filter matches the effective status, so a past-deadline
    /// pending invitation is listed as expired.
    pub async fn list_invitations(
        &self,
        actor: &UserIdentity,
        query: InvitationQuery,
    ) -> AppResult<Vec<Invitation>> {
        let actor_role = self.require_invitation_reader(actor).await?;
        let now = self.clock.now();

        Ok(self
            .invitation_repository
            .list_invitations(actor.organization_id())
            .await?
            .into_iter()
            .filter(|invitation| AuthorizationService::can_manage(actor_role, invitation.role()))
            .filter(|invitation| query.role.is_none_or(|role| invitation.role() == role))
            .filter(|invitation| {
                query
                    .status
                    .is_none_or(|status| invitation.effective_status(now) == status)
            })
            .collect())
    }

    /// Counts effectively pending invitations per role; every role has an entry.
    pub async fn count_pending_by_role(
        &self,
        actor: &UserIdentity,
    ) -> AppResult<BTreeMap<RoleType, usize>> {
        let pending = self
            .list_invitations(
                actor,
                InvitationQuery {
                    status: Some(InvitationStatus::Pending),
                    role: None,
                },
            )
            .await?;

        let mut counts: BTreeMap<RoleType, usize> =
            RoleType::all().iter().map(|role| (*role, 0)).collect();
        for invitation in pending {
            *counts.entry(invitation.role()).or_default() += 1;
        }
        Ok(counts)
    }

    /// Moves every stored-pending invitation past its deadline to expired.
    ///
    /// Scans one organization or, with `None`, all of them. Returns the
    /// number of invitations transitioned.
    pub async fn expire_stale_invitations(
        &self,
        organization_id: Option<OrganizationId>,
    ) -> AppResult<u64> {
        let now = self.clock.now();
        let expired = self
            .invitation_repository
            .expire_stale(organization_id, now)
            .await?;

        for invitation in &expired {
            self.record(
                invitation,
                crate::SYSTEM_SUBJECT,
                AuditAction::InvitationExpired,
                InvitationStatus::Pending,
                None,
            )
            .await?;
        }

        let count = expired.len() as u64;
        if count > 0 {
            info!(count, "expired stale invitations");
        }
        Ok(count)
    }
}
