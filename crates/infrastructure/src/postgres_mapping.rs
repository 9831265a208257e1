//! Row conversion helpers shared by the PostgreSQL adapters.

use std::str::FromStr;

use edsetu_core::{AppError, AppResult};
use edsetu_domain::{Permission, PermissionBinding, RoleType};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

pub(crate) fn parse_role(value: &str) -> AppResult<RoleType> {
    RoleType::from_str(value)
        .map_err(|error| AppError::Internal(format!("invalid stored role '{value}': {error}")))
}

pub(crate) fn parse_permission(value: &str) -> AppResult<Permission> {
    Permission::from_str(value).map_err(|error| {
        AppError::Internal(format!("invalid stored permission '{value}': {error}"))
    })
}

pub(crate) fn binding_from_rows(
    rows: impl IntoIterator<Item = (String, bool)>,
) -> AppResult<PermissionBinding> {
    let entries = rows
        .into_iter()
        .map(|(permission, enabled)| parse_permission(&permission).map(|value| (value, enabled)))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(PermissionBinding::from_entries(entries))
}

pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    has_code(error, UNIQUE_VIOLATION)
}

pub(crate) fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    has_code(error, FOREIGN_KEY_VIOLATION)
}

fn has_code(error: &sqlx::Error, code: &str) -> bool {
    if let sqlx::Error::Database(database_error) = error
        && database_error.code().as_deref() == Some(code)
    {
        return true;
    }
    false
}
