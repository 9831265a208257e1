//! Invitation state machine.
//!
//! `pending` is the only non-terminal state. Expiry is derived from
//! `expires_at`, so a stored `pending` invitation past its deadline already
//! behaves as `expired`; every transition method persists that derivation on
//! the value before reporting it.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use edsetu_core::{AppError, AppResult, OrganizationId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{InvitationContact, RoleType};

/// Number of days an invitation stays acceptable after issue or resend.
pub const INVITATION_TTL_DAYS: i64 = 7;

/// Lifecycle status of an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    /// Awaiting acceptance.
    Pending,
    /// Accepted; a role assignment exists.
    Accepted,
    /// Withdrawn by an authorized member.
    Revoked,
    /// Deadline passed before acceptance.
    Expired,
}

impl InvitationStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
        }
    }

    /// Returns whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl FromStr for InvitationStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "revoked" => Ok(Self::Revoked),
            "expired" => Ok(Self::Expired),
            _ => Err(AppError::Validation(format!(
                "unknown invitation status '{value}'"
            ))),
        }
    }
}

/// Caller-supplied invitation attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationDraft {
    /// Organization the invitee joins.
    pub organization_id: OrganizationId,
    /// Delivery channels.
    pub contact: InvitationContact,
    /// Optional invitee display name.
    pub display_name: Option<String>,
    /// Role granted on acceptance.
    pub role: RoleType,
    /// Inviter subject.
    pub invited_by: String,
    /// Inviter display name shown in the notification.
    pub invited_by_name: String,
    /// Inviter role at issue time.
    pub invited_by_role: RoleType,
    /// Optional personal note.
    pub message: Option<String>,
}

/// Invitation aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    invitation_id: Uuid,
    draft: InvitationDraft,
    status: InvitationStatus,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    accepted_at: Option<DateTime<Utc>>,
    accepted_by: Option<String>,
}

impl Invitation {
    /// Issues a new pending invitation expiring [`INVITATION_TTL_DAYS`] after `now`.
    pub fn issue(draft: InvitationDraft, now: DateTime<Utc>) -> AppResult<Self> {
        if !draft.invited_by_role.can_manage(draft.role) {
            return Err(AppError::AssignerNotAuthorized(format!(
                "role '{}' cannot invite role '{}'",
                draft.invited_by_role, draft.role
            )));
        }

        Ok(Self {
            invitation_id: Uuid::new_v4(),
            draft,
            status: InvitationStatus::Pending,
            created_at: now,
            expires_at: now + ttl(),
            accepted_at: None,
            accepted_by: None,
        })
    }

    /// Rebuilds an invitation from persisted state.
    #[must_use]
    pub fn restore(
        invitation_id: Uuid,
        draft: InvitationDraft,
        status: InvitationStatus,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        accepted_at: Option<DateTime<Utc>>,
        accepted_by: Option<String>,
    ) -> Self {
        Self {
            invitation_id,
            draft,
            status,
            created_at,
            expires_at,
            accepted_at,
            accepted_by,
        }
    }

    /// Returns the invitation identifier.
    #[must_use]
    pub fn invitation_id(&self) -> Uuid {
        self.invitation_id
    }

    /// Returns the caller-supplied attributes.
    #[must_use]
    pub fn draft(&self) -> &InvitationDraft {
        &self.draft
    }

    /// Returns the organization scope.
    #[must_use]
    pub fn organization_id(&self) -> OrganizationId {
        self.draft.organization_id
    }

    /// Returns the delivery channels.
    #[must_use]
    pub fn contact(&self) -> &InvitationContact {
        &self.draft.contact
    }

    /// Returns the role granted on acceptance.
    #[must_use]
    pub fn role(&self) -> RoleType {
        self.draft.role
    }

    /// Returns the inviter subject.
    #[must_use]
    pub fn invited_by(&self) -> &str {
        self.draft.invited_by.as_str()
    }

    /// Returns the stored status, which may lag behind [`Self::effective_status`].
    #[must_use]
    pub fn stored_status(&self) -> InvitationStatus {
        self.status
    }

    /// Returns the status with expiry derived from `now`.
    #[must_use]
    pub fn effective_status(&self, now: DateTime<Utc>) -> InvitationStatus {
        if self.is_past_deadline(now) {
            InvitationStatus::Expired
        } else {
            self.status
        }
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the acceptance deadline.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns the acceptance timestamp.
    #[must_use]
    pub fn accepted_at(&self) -> Option<DateTime<Utc>> {
        self.accepted_at
    }

    /// Returns the subject that accepted the invitation.
    #[must_use]
    pub fn accepted_by(&self) -> Option<&str> {
        self.accepted_by.as_deref()
    }

    /// Marks the invitation accepted by `user_id`.
    ///
    /// A past-deadline invitation is moved to `expired` and
    /// `InvitationExpired` is returned.
    pub fn accept(&mut self, user_id: &str, now: DateTime<Utc>) -> AppResult<()> {
        self.ensure_pending()?;
        if self.expire(now) {
            return Err(AppError::InvitationExpired(format!(
                "invitation '{}' expired at {}",
                self.invitation_id,
                self.expires_at.to_rfc3339()
            )));
        }

        self.status = InvitationStatus::Accepted;
        self.accepted_at = Some(now);
        self.accepted_by = Some(user_id.to_owned());
        Ok(())
    }

    /// Withdraws a pending invitation.
    pub fn revoke(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        self.ensure_live(now)?;
        self.status = InvitationStatus::Revoked;
        Ok(())
    }

    /// Restarts the acceptance window of a pending invitation.
    pub fn resend(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        self.ensure_live(now)?;
        self.expires_at = now + ttl();
        Ok(())
    }

    /// Persists derived expiry on the value; returns whether it changed.
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_past_deadline(now) {
            self.status = InvitationStatus::Expired;
            return true;
        }
        false
    }

    fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && now > self.expires_at
    }

    fn ensure_pending(&self) -> AppResult<()> {
        if self.status.is_terminal() {
            return Err(AppError::InvitationNotPending(format!(
                "invitation '{}' is {}",
                self.invitation_id,
                self.status.as_str()
            )));
        }
        Ok(())
    }

    fn ensure_live(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        self.ensure_pending()?;
        if self.expire(now) {
            return Err(AppError::InvitationNotPending(format!(
                "invitation '{}' is expired",
                self.invitation_id
            )));
        }
        Ok(())
    }
}

fn ttl() -> Duration {
    Duration::days(INVITATION_TTL_DAYS)
}
