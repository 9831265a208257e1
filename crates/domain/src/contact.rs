//! Contact address types used to address invitations.

use edsetu_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Validated, lower-cased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one `@`,
    /// local part and domain are non-empty, domain contains at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        };

        if domain.contains('@') {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Phone number normalized to a leading `+` followed by digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Creates a normalized phone number.
    ///
    /// The value must start with `+` and a country code, so one number has a
    /// single stored form. Spaces, dashes, dots and parentheses are stripped
    /// and 7 to 15 digits must remain (E.164 upper bound).
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        let Some(rest) = trimmed.strip_prefix('+') else {
            return Err(AppError::Validation(
                "phone number must start with '+' and a country code".to_owned(),
            ));
        };

        let mut digits = String::with_capacity(rest.len());
        for character in rest.chars() {
            match character {
                '0'..='9' => digits.push(character),
                ' ' | '-' | '.' | '(' | ')' => {}
                _ => {
                    return Err(AppError::Validation(format!(
                        "phone number contains invalid character '{character}'"
                    )));
                }
            }
        }

        if !(7..=15).contains(&digits.len()) {
            return Err(AppError::Validation(
                "phone number must contain between 7 and 15 digits".to_owned(),
            ));
        }

        Ok(Self(format!("+{digits}")))
    }

    /// Returns the normalized phone string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Where an invitation is delivered. At least one channel is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationContact {
    email: Option<EmailAddress>,
    phone: Option<PhoneNumber>,
}

impl InvitationContact {
    /// Creates a contact from optional raw email and phone values.
    pub fn new(email: Option<&str>, phone: Option<&str>) -> AppResult<Self> {
        let email = email
            .filter(|value| !value.trim().is_empty())
            .map(EmailAddress::new)
            .transpose()?;
        let phone = phone
            .filter(|value| !value.trim().is_empty())
            .map(PhoneNumber::new)
            .transpose()?;

        Self::from_parts(email, phone)
    }

    /// Creates a contact from already validated parts.
    pub fn from_parts(email: Option<EmailAddress>, phone: Option<PhoneNumber>) -> AppResult<Self> {
        if email.is_none() && phone.is_none() {
            return Err(AppError::Validation(
                "invitation requires an email address or a phone number".to_owned(),
            ));
        }

        Ok(Self { email, phone })
    }

    /// Returns the email channel, if any.
    #[must_use]
    pub fn email(&self) -> Option<&EmailAddress> {
        self.email.as_ref()
    }

    /// Returns the phone channel, if any.
    #[must_use]
    pub fn phone(&self) -> Option<&PhoneNumber> {
        self.phone.as_ref()
    }

    /// Returns whether two contacts share an email address or phone number.
    #[must_use]
    pub fn overlaps(&self, other: &InvitationContact) -> bool {
        let same_email = matches!((&self.email, &other.email), (Some(left), Some(right)) if left == right);
        let same_phone = matches!((&self.phone, &other.phone), (Some(left), Some(right)) if left == right);
        same_email || same_phone
    }
}
