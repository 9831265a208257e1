use serde::{Deserialize, Serialize};

use crate::OrganizationId;

/// User information persisted in the authenticated session.
///
/// The subject is the opaque user id issued by the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: String,
    display_name: String,
    email: Option<String>,
    organization_id: OrganizationId,
}

impl UserIdentity {
    /// Creates a user identity from authentication and organization data.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        display_name: impl Into<String>,
        email: Option<String>,
        organization_id: OrganizationId,
    ) -> Self {
        Self {
            subject: subject.into(),
            display_name: display_name.into(),
            email,
            organization_id,
        }
    }

    /// Returns the stable subject identifier.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the email, if one is known.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the organization linked to the identity.
    #[must_use]
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }
}
