use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use edsetu_application::RoleRepository;
use edsetu_core::{AppError, AppResult, OrganizationId};
use edsetu_domain::{PermissionBinding, RoleType};

use crate::postgres_mapping::{binding_from_rows, parse_role};

/// PostgreSQL-backed role registry.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RolePermissionRow {
    role: String,
    permission: Option<String>,
    enabled: Option<bool>,
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn seed_roles(
        &self,
        organization_id: OrganizationId,
        roles: Vec<(RoleType, PermissionBinding)>,
    ) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        for (role, binding) in roles {
            let inserted = sqlx::query(
                r#"
                INSERT INTO organization_roles (organization_id, role)
                VALUES ($1, $2)
                ON CONFLICT (organization_id, role) DO NOTHING
                "#,
            )
            .bind(organization_id.as_uuid())
            .bind(role.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to seed role: {error}")))?;

            if inserted.rows_affected() == 0 {
                continue;
            }

            for (permission, enabled) in binding.entries() {
                sqlx::query(
                    r#"
                    INSERT INTO role_permissions (organization_id, role, permission, enabled)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(organization_id.as_uuid())
                .bind(role.as_str())
                .bind(permission.as_str())
                .bind(enabled)
                .execute(&mut *transaction)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to seed role permissions: {error}"))
                })?;
            }
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn find_role_binding(
        &self,
        organization_id: OrganizationId,
        role: RoleType,
    ) -> AppResult<Option<PermissionBinding>> {
        let rows = sqlx::query_as::<_, RolePermissionRow>(
            r#"
            SELECT
                roles.role,
                permissions.permission,
                permissions.enabled
            FROM organization_roles AS roles
            LEFT JOIN role_permissions AS permissions
                ON permissions.organization_id = roles.organization_id
                AND permissions.role = roles.role
            WHERE roles.organization_id = $1 AND roles.role = $2
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role binding: {error}")))?;

        if rows.is_empty() {
            return Ok(None);
        }

        binding_from_rows(rows.into_iter().filter_map(permission_entry)).map(Some)
    }

    async fn list_role_bindings(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<(RoleType, PermissionBinding)>> {
        let rows = sqlx::query_as::<_, RolePermissionRow>(
            r#"
            SELECT
                roles.role,
                permissions.permission,
                permissions.enabled
            FROM organization_roles AS roles
            LEFT JOIN role_permissions AS permissions
                ON permissions.organization_id = roles.organization_id
                AND permissions.role = roles.role
            WHERE roles.organization_id = $1
            ORDER BY roles.role, permissions.permission
            "#,
        )
        .bind(organization_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        let mut grouped: BTreeMap<RoleType, Vec<(String, bool)>> = BTreeMap::new();
        for row in rows {
            let role = parse_role(&row.role)?;
            let entries = grouped.entry(role).or_default();
            if let Some(entry) = permission_entry(row) {
                entries.push(entry);
            }
        }

        grouped
            .into_iter()
            .map(|(role, entries)| binding_from_rows(entries).map(|binding| (role, binding)))
            .collect()
    }

    async fn save_role_binding(
        &self,
        organization_id: OrganizationId,
        role: RoleType,
        binding: &PermissionBinding,
    ) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        sqlx::query(
            r#"
            DELETE FROM role_permissions
            WHERE organization_id = $1 AND role = $2
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(role.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to clear role permissions: {error}"))
        })?;

        for (permission, enabled) in binding.entries() {
            sqlx::query(
                r#"
                INSERT INTO role_permissions (organization_id, role, permission, enabled)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(organization_id.as_uuid())
            .bind(role.as_str())
            .bind(permission.as_str())
            .bind(enabled)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                if crate::postgres_mapping::is_foreign_key_violation(&error) {
                    return AppError::NotFound(format!(
                        "role '{role}' does not exist in organization '{organization_id}'"
                    ));
                }
                AppError::Internal(format!("failed to persist role permissions: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }
}

fn permission_entry(row: RolePermissionRow) -> Option<(String, bool)> {
    match (row.permission, row.enabled) {
        (Some(permission), Some(enabled)) => Some((permission, enabled)),
        _ => None,
    }
}
