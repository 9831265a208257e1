use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use edsetu_application::{AssignmentQuery, AssignmentRepository, UserRoleAssignment};
use edsetu_core::{AppError, AppResult, OrganizationId};
use edsetu_domain::PermissionBinding;

use crate::postgres_mapping::{
    binding_from_rows, is_foreign_key_violation, is_unique_violation, parse_role,
};

/// PostgreSQL-backed repository for user-role assignments and overrides.
#[derive(Clone)]
pub struct PostgresAssignmentRepository {
    pool: PgPool,
}

impl PostgresAssignmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct AssignmentRow {
    organization_id: uuid::Uuid,
    user_id: String,
    role: String,
    assigned_by: String,
    assigned_at: DateTime<Utc>,
}

impl AssignmentRow {
    pub(crate) fn into_assignment(self) -> AppResult<UserRoleAssignment> {
        Ok(UserRoleAssignment {
            organization_id: OrganizationId::from_uuid(self.organization_id),
            user_id: self.user_id,
            role: parse_role(&self.role)?,
            assigned_by: self.assigned_by,
            assigned_at: self.assigned_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct OverrideRow {
    permission: String,
    enabled: bool,
}

/// Inserts an assignment inside an open transaction.
pub(crate) async fn insert_assignment(
    transaction: &mut Transaction<'_, Postgres>,
    assignment: &UserRoleAssignment,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO user_role_assignments (
            organization_id,
            user_id,
            role,
            assigned_by,
            assigned_at
        )
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(assignment.organization_id.as_uuid())
    .bind(assignment.user_id.as_str())
    .bind(assignment.role.as_str())
    .bind(assignment.assigned_by.as_str())
    .bind(assignment.assigned_at)
    .execute(&mut **transaction)
    .await
    .map_err(|error| {
        if is_unique_violation(&error) {
            return AppError::DuplicateAssignment(format!(
                "user '{}' already holds a role in organization '{}'",
                assignment.user_id, assignment.organization_id
            ));
        }
        if is_foreign_key_violation(&error) {
            return AppError::NotFound(format!(
                "role '{}' does not exist in organization '{}'",
                assignment.role, assignment.organization_id
            ));
        }
        AppError::Internal(format!("failed to insert role assignment: {error}"))
    })?;

    Ok(())
}

async fn replace_overrides(
    transaction: &mut Transaction<'_, Postgres>,
    organization_id: OrganizationId,
    user_id: &str,
    overrides: &PermissionBinding,
) -> AppResult<()> {
    sqlx::query(
        r#"
        DELETE FROM user_permission_overrides
        WHERE organization_id = $1 AND user_id = $2
        "#,
    )
    .bind(organization_id.as_uuid())
    .bind(user_id)
    .execute(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to clear overrides: {error}")))?;

    for (permission, enabled) in overrides.entries() {
        sqlx::query(
            r#"
            INSERT INTO user_permission_overrides (organization_id, user_id, permission, enabled)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(user_id)
        .bind(permission.as_str())
        .bind(enabled)
        .execute(&mut **transaction)
        .await
        .map_err(|error| {
            if is_foreign_key_violation(&error) {
                return AppError::NotFound(format!(
                    "user '{user_id}' holds no role in organization '{organization_id}'"
                ));
            }
            AppError::Internal(format!("failed to persist override: {error}"))
        })?;
    }

    Ok(())
}

#[async_trait]
impl AssignmentRepository for PostgresAssignmentRepository {
    async fn create_assignment(
        &self,
        assignment: UserRoleAssignment,
        overrides: PermissionBinding,
    ) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        insert_assignment(&mut transaction, &assignment).await?;
        if !overrides.is_empty() {
            replace_overrides(
                &mut transaction,
                assignment.organization_id,
                assignment.user_id.as_str(),
                &overrides,
            )
            .await?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn find_assignment(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
    ) -> AppResult<Option<UserRoleAssignment>> {
        sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT organization_id, user_id, role, assigned_by, assigned_at
            FROM user_role_assignments
            WHERE organization_id = $1 AND user_id = $2
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role assignment: {error}")))?
        .map(AssignmentRow::into_assignment)
        .transpose()
    }

    async fn delete_assignment(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
    ) -> AppResult<UserRoleAssignment> {
        sqlx::query_as::<_, AssignmentRow>(
            r#"
            DELETE FROM user_role_assignments
            WHERE organization_id = $1 AND user_id = $2
            RETURNING organization_id, user_id, role, assigned_by, assigned_at
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to delete role assignment: {error}"))
        })?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "user '{user_id}' holds no role in organization '{organization_id}'"
            ))
        })?
        .into_assignment()
    }

    async fn list_assignments(
        &self,
        organization_id: OrganizationId,
        query: AssignmentQuery,
    ) -> AppResult<Vec<UserRoleAssignment>> {
        sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT organization_id, user_id, role, assigned_by, assigned_at
            FROM user_role_assignments
            WHERE organization_id = $1
                AND ($2::TEXT IS NULL OR role = $2)
            ORDER BY user_id
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(query.role.map(|role| role.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list role assignments: {error}"))
        })?
        .into_iter()
        .map(AssignmentRow::into_assignment)
        .collect()
    }

    async fn find_user_overrides(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
    ) -> AppResult<PermissionBinding> {
        let rows = sqlx::query_as::<_, OverrideRow>(
            r#"
            SELECT permission, enabled
            FROM user_permission_overrides
            WHERE organization_id = $1 AND user_id = $2
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load overrides: {error}")))?;

        binding_from_rows(rows.into_iter().map(|row| (row.permission, row.enabled)))
    }

    async fn save_user_overrides(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
        overrides: &PermissionBinding,
    ) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        replace_overrides(&mut transaction, organization_id, user_id, overrides).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }
}
