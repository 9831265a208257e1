//! Shared primitives for all Rust crates in EdSetu.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use auth::UserIdentity;

/// Result type used across EdSetu crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Organization identifier used as the partition key for every persisted resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrganizationId(Uuid);

impl OrganizationId {
    /// Creates a random organization identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an organization identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OrganizationId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for OrganizationId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Application error categories.
///
/// Every variant is an expected, recoverable outcome. The payload carries an
/// internal detail message that may reference identifiers; callers facing end
/// users should render [`AppError::public_message`] instead.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// User is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but blocked by authorization policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Reference to a permission outside the catalog.
    #[error("unknown permission: {0}")]
    UnknownPermission(String),

    /// The user already holds an active role in the organization.
    #[error("duplicate assignment: {0}")]
    DuplicateAssignment(String),

    /// A pending invitation already exists for the same contact.
    #[error("duplicate pending invitation: {0}")]
    DuplicatePendingInvitation(String),

    /// The invitation has already left the pending state.
    #[error("invitation not pending: {0}")]
    InvitationNotPending(String),

    /// The invitation expiry timestamp has passed.
    #[error("invitation expired: {0}")]
    InvitationExpired(String),

    /// The assigner does not strictly outrank the target role.
    #[error("assigner not authorized: {0}")]
    AssignerNotAuthorized(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns a stable snake_case identifier for the error kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::UnknownPermission(_) => "unknown_permission",
            Self::DuplicateAssignment(_) => "duplicate_assignment",
            Self::DuplicatePendingInvitation(_) => "duplicate_pending_invitation",
            Self::InvitationNotPending(_) => "invitation_not_pending",
            Self::InvitationExpired(_) => "invitation_expired",
            Self::AssignerNotAuthorized(_) => "assigner_not_authorized",
            Self::Internal(_) => "internal",
        }
    }

    /// Returns a short human-readable message free of internal identifiers.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Validation(_) => "The request contains invalid data.",
            Self::NotFound(_) => "The requested item could not be found.",
            Self::Conflict(_) => "The request conflicts with the current state.",
            Self::Unauthorized(_) => "Please sign in to continue.",
            Self::Forbidden(_) => "You do not have access to this action.",
            Self::UnknownPermission(_) => "That permission does not exist.",
            Self::DuplicateAssignment(_) => "This user already has a role in the organization.",
            Self::DuplicatePendingInvitation(_) => {
                "An invitation is already pending for this contact."
            }
            Self::InvitationNotPending(_) => "This invitation is no longer pending.",
            Self::InvitationExpired(_) => "This invitation has expired.",
            Self::AssignerNotAuthorized(_) => "You cannot assign a role at or above your own.",
            Self::Internal(_) => "Something went wrong. Please try again.",
        }
    }

    /// Returns the internal detail carried by the error.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::Validation(detail)
            | Self::NotFound(detail)
            | Self::Conflict(detail)
            | Self::Unauthorized(detail)
            | Self::Forbidden(detail)
            | Self::UnknownPermission(detail)
            | Self::DuplicateAssignment(detail)
            | Self::DuplicatePendingInvitation(detail)
            | Self::InvitationNotPending(detail)
            | Self::InvitationExpired(detail)
            | Self::AssignerNotAuthorized(detail)
            | Self::Internal(detail) => detail.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, NonEmptyString, OrganizationId};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn organization_id_formats_as_uuid() {
        let organization_id = OrganizationId::new();
        assert_eq!(organization_id.to_string().len(), 36);
    }

    #[test]
    fn public_message_never_echoes_detail() {
        let error = AppError::NotFound("invitation 'c0ffee' was not found".to_owned());
        assert!(!error.public_message().contains("c0ffee"));
        assert_eq!(error.code(), "not_found");
        assert_eq!(error.detail(), "invitation 'c0ffee' was not found");
    }

    #[test]
    fn forbidden_and_not_found_are_distinct_kinds() {
        let forbidden = AppError::Forbidden("x".to_owned());
        let not_found = AppError::NotFound("x".to_owned());
        assert_ne!(forbidden.code(), not_found.code());
    }
}
