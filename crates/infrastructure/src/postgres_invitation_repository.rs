use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use edsetu_application::{InvitationRepository, UserRoleAssignment};
use edsetu_core::{AppError, AppResult, OrganizationId};
use edsetu_domain::{
    EmailAddress, Invitation, InvitationContact, InvitationDraft, InvitationStatus, PhoneNumber,
};

use crate::postgres_assignment_repository::insert_assignment;
use crate::postgres_mapping::{is_unique_violation, parse_role};

const INVITATION_COLUMNS: &str = r#"
    id,
    organization_id,
    email,
    phone,
    display_name,
    role,
    invited_by,
    invited_by_name,
    invited_by_role,
    message,
    status,
    created_at,
    expires_at,
    accepted_at,
    accepted_by
"#;

/// PostgreSQL-backed invitation repository.
///
/// Status transitions are compare-and-swap updates on the stored status, so
/// racing accept and revoke calls resolve to exactly one winner.
#[derive(Clone)]
pub struct PostgresInvitationRepository {
    pool: PgPool,
}

impl PostgresInvitationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct InvitationRow {
    id: Uuid,
    organization_id: Uuid,
    email: Option<String>,
    phone: Option<String>,
    display_name: Option<String>,
    role: String,
    invited_by: String,
    invited_by_name: String,
    invited_by_role: String,
    message: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    accepted_at: Option<DateTime<Utc>>,
    accepted_by: Option<String>,
}

impl InvitationRow {
    fn into_invitation(self) -> AppResult<Invitation> {
        let email = self.email.map(EmailAddress::new).transpose()?;
        let phone = self.phone.map(PhoneNumber::new).transpose()?;
        let status = InvitationStatus::from_str(&self.status).map_err(|error| {
            AppError::Internal(format!("invalid stored invitation status: {error}"))
        })?;

        Ok(Invitation::restore(
            self.id,
            InvitationDraft {
                organization_id: OrganizationId::from_uuid(self.organization_id),
                contact: InvitationContact::from_parts(email, phone)?,
                display_name: self.display_name,
                role: parse_role(&self.role)?,
                invited_by: self.invited_by,
                invited_by_name: self.invited_by_name,
                invited_by_role: parse_role(&self.invited_by_role)?,
                message: self.message,
            },
            status,
            self.created_at,
            self.expires_at,
            self.accepted_at,
            self.accepted_by,
        ))
    }
}

fn into_invitations(rows: Vec<InvitationRow>) -> AppResult<Vec<Invitation>> {
    rows.into_iter().map(InvitationRow::into_invitation).collect()
}

#[async_trait]
impl InvitationRepository for PostgresInvitationRepository {
    async fn insert_invitation(&self, invitation: &Invitation) -> AppResult<()> {
        let draft = invitation.draft();
        sqlx::query(
            r#"
            INSERT INTO invitations (
                id,
                organization_id,
                email,
                phone,
                display_name,
                role,
                invited_by,
                invited_by_name,
                invited_by_role,
                message,
                status,
                created_at,
                expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(invitation.invitation_id())
        .bind(invitation.organization_id().as_uuid())
        .bind(draft.contact.email().map(EmailAddress::as_str))
        .bind(draft.contact.phone().map(PhoneNumber::as_str))
        .bind(draft.display_name.as_deref())
        .bind(draft.role.as_str())
        .bind(draft.invited_by.as_str())
        .bind(draft.invited_by_name.as_str())
        .bind(draft.invited_by_role.as_str())
        .bind(draft.message.as_deref())
        .bind(invitation.stored_status().as_str())
        .bind(invitation.created_at())
        .bind(invitation.expires_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                return AppError::DuplicatePendingInvitation(format!(
                    "a pending invitation already exists for this contact in organization '{}'",
                    invitation.organization_id()
                ));
            }
            AppError::Internal(format!("failed to insert invitation: {error}"))
        })?;

        Ok(())
    }

    async fn find_invitation(&self, invitation_id: Uuid) -> AppResult<Option<Invitation>> {
        sqlx::query_as::<_, InvitationRow>(&format!(
            "SELECT {INVITATION_COLUMNS} FROM invitations WHERE id = $1"
        ))
        .bind(invitation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find invitation: {error}")))?
        .map(InvitationRow::into_invitation)
        .transpose()
    }

    async fn update_invitation(
        &self,
        invitation: &Invitation,
        expected: InvitationStatus,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE invitations
            SET status = $2,
                expires_at = $3,
                accepted_at = $4,
                accepted_by = $5
            WHERE id = $1 AND status = $6
            "#,
        )
        .bind(invitation.invitation_id())
        .bind(invitation.stored_status().as_str())
        .bind(invitation.expires_at())
        .bind(invitation.accepted_at())
        .bind(invitation.accepted_by())
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update invitation: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::InvitationNotPending(format!(
                "invitation '{}' is no longer {}",
                invitation.invitation_id(),
                expected.as_str()
            )));
        }

        Ok(())
    }

    async fn accept_invitation(
        &self,
        invitation: &Invitation,
        assignment: UserRoleAssignment,
    ) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let flipped = sqlx::query(
            r#"
            UPDATE invitations
            SET status = 'accepted',
                accepted_at = $2,
                accepted_by = $3
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(invitation.invitation_id())
        .bind(invitation.accepted_at())
        .bind(invitation.accepted_by())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to accept invitation: {error}")))?;

        if flipped.rows_affected() == 0 {
            return Err(AppError::InvitationNotPending(format!(
                "invitation '{}' is no longer pending",
                invitation.invitation_id()
            )));
        }

        insert_assignment(&mut transaction, &assignment).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn find_pending_for_contact(
        &self,
        organization_id: OrganizationId,
        contact: &InvitationContact,
    ) -> AppResult<Vec<Invitation>> {
        let rows = sqlx::query_as::<_, InvitationRow>(&format!(
            r#"
            SELECT {INVITATION_COLUMNS}
            FROM invitations
            WHERE organization_id = $1
                AND status = 'pending'
                AND (email = $2 OR phone = $3)
            "#
        ))
        .bind(organization_id.as_uuid())
        .bind(contact.email().map(EmailAddress::as_str))
        .bind(contact.phone().map(PhoneNumber::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find pending invitations: {error}"))
        })?;

        into_invitations(rows)
    }

    async fn list_invitations(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<Invitation>> {
        let rows = sqlx::query_as::<_, InvitationRow>(&format!(
            r#"
            SELECT {INVITATION_COLUMNS}
            FROM invitations
            WHERE organization_id = $1
            ORDER BY created_at DESC, id
            "#
        ))
        .bind(organization_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list invitations: {error}")))?;

        into_invitations(rows)
    }

    async fn expire_stale(
        &self,
        organization_id: Option<OrganizationId>,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Invitation>> {
        let rows = sqlx::query_as::<_, InvitationRow>(&format!(
            r#"
            UPDATE invitations
            SET status = 'expired'
            WHERE status = 'pending'
                AND expires_at < $1
                AND ($2::UUID IS NULL OR organization_id = $2)
            RETURNING {INVITATION_COLUMNS}
            "#
        ))
        .bind(now)
        .bind(organization_id.map(|value| value.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to expire stale invitations: {error}"))
        })?;

        into_invitations(rows)
    }
}

#[cfg(test)]
mod tests;
