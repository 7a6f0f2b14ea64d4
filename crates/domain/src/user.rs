//! User identifiers and validation rules.
//!
//! Email and password rules follow the OWASP Authentication cheat sheet.

use fusionboard_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID value.
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

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated, lowercased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Structural checks only: non-empty, exactly one `@`, non-empty local
    /// part, domain with at least one `.`, total length under 254.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let parts: Vec<&str> = trimmed.splitn(2, '@').collect();
        if parts.len() != 2 {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        if parts[0].is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if parts[1].is_empty() || !parts[1].contains('.') {
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

/// Minimum password length (NIST SP800-63B).
pub const PASSWORD_MIN_LENGTH: usize = 10;

/// Maximum password length to allow passphrases while bounding hash cost.
pub const PASSWORD_MAX_LENGTH: usize = 128;

/// Validates a plaintext password against length and breached-password rules.
pub fn validate_password(password: &str) -> AppResult<()> {
    let char_count = password.chars().count();

    if char_count < PASSWORD_MIN_LENGTH {
        return Err(AppError::Validation(format!(
            "password must be at least {PASSWORD_MIN_LENGTH} characters"
        )));
    }

    if char_count > PASSWORD_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "password must not exceed {PASSWORD_MAX_LENGTH} characters"
        )));
    }

    if is_common_password(password) {
        return Err(AppError::Validation(
            "this password is too common and has appeared in data breaches".to_owned(),
        ));
    }

    Ok(())
}

fn is_common_password(password: &str) -> bool {
    let lowered = password.to_lowercase();
    COMMON_PASSWORDS.iter().any(|entry| *entry == lowered)
}

/// Top breached passwords (subset for fast embedded check).
static COMMON_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "password123",
    "passw0rd",
    "1234567890",
    "qwertyuiop",
    "qwerty123",
    "iloveyou",
    "trustno1",
    "sunshine",
    "1q2w3e4r5t",
    "letmein123",
    "welcome123",
    "administrator",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_is_accepted_and_lowercased() {
        let email = EmailAddress::new("PM@Example.COM");
        assert_eq!(email.ok().map(String::from), Some("pm@example.com".into()));
    }

    #[test]
    fn email_without_at_is_rejected() {
        assert!(EmailAddress::new("noatsign").is_err());
    }

    #[test]
    fn email_without_domain_dot_is_rejected() {
        assert!(EmailAddress::new("user@nodot").is_err());
    }

    #[test]
    fn short_password_is_rejected() {
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn common_password_is_rejected() {
        assert!(validate_password("password123").is_err());
    }

    #[test]
    fn adequate_passphrase_is_accepted() {
        assert!(validate_password("a-reasonable-passphrase").is_ok());
    }

    #[test]
    fn very_long_password_is_rejected() {
        let long = "a".repeat(PASSWORD_MAX_LENGTH + 1);
        assert!(validate_password(&long).is_err());
    }
}
