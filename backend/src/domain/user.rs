//! User accounts and their validated attributes.
//!
//! Email and username are case-folded to lowercase at construction time so
//! uniqueness checks in the store never depend on collation settings.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::id::RecordId;

/// Validation errors for user attributes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Email was empty or had no `@`.
    #[error("email must be a valid address")]
    InvalidEmail,
    /// Email exceeded the storage bound.
    #[error("email must be at most {max} characters")]
    EmailTooLong { max: usize },
    /// Username was shorter than the minimum.
    #[error("username must be at least {min} characters")]
    UsernameTooShort { min: usize },
    /// Username exceeded the maximum.
    #[error("username must be at most {max} characters")]
    UsernameTooLong { max: usize },
    /// Username contained characters outside `[a-z0-9_]`.
    #[error("username may only contain letters, numbers, and underscores")]
    UsernameInvalidCharacters,
}

/// Minimum allowed username length.
pub const USERNAME_MIN: usize = 3;
/// Maximum allowed username length.
pub const USERNAME_MAX: usize = 20;
/// Maximum allowed email length.
pub const EMAIL_MAX: usize = 100;

/// Lowercased, validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`], folding to lowercase.
    pub fn new(email: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let email = email.as_ref().trim().to_lowercase();
        let mut parts = email.splitn(2, '@');
        let local = parts.next().unwrap_or_default();
        let domain = parts.next().unwrap_or_default();
        if local.is_empty() || domain.is_empty() || !domain.contains('.') {
            return Err(UserValidationError::InvalidEmail);
        }
        if email.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        Ok(Self(email))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Lowercased, validated username.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`], folding to lowercase.
    pub fn new(username: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let username = username.as_ref().trim().to_lowercase();
        let length = username.chars().count();
        if length < USERNAME_MIN {
            return Err(UserValidationError::UsernameTooShort { min: USERNAME_MIN });
        }
        if length > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(UserValidationError::UsernameInvalidCharacters);
        }
        Ok(Self(username))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Persisted user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Primary key.
    #[schema(value_type = String, example = "cr2x1m9v4kq8w3z7t5b0a6yd")]
    pub id: RecordId,
    /// Unique lowercase email address.
    #[schema(value_type = String, example = "kody@kcd.dev")]
    pub email: Email,
    /// Unique lowercase username.
    #[schema(value_type = String, example = "kody")]
    pub username: Username,
    /// Optional display name; unlike the username it is free-form.
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh user with a generated id and current timestamps.
    pub fn create(email: Email, username: Username, name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::random(),
            email,
            username,
            name,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A search result row: user attributes plus the profile image id, ordered
/// upstream by most recent note activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserListing {
    #[schema(value_type = String)]
    pub id: RecordId,
    #[schema(value_type = String)]
    pub username: Username,
    pub name: Option<String>,
    #[schema(value_type = Option<String>)]
    pub image_id: Option<RecordId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Kody@KCD.dev", "kody@kcd.dev")]
    #[case("  spaced@example.com  ", "spaced@example.com")]
    fn email_folds_to_lowercase(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(Email::new(raw).expect("valid email").as_ref(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("nodomain@")]
    #[case("@nolocal.com")]
    #[case("bare-string")]
    #[case("nodot@localhost")]
    fn email_rejects_malformed_input(#[case] raw: &str) {
        assert_eq!(
            Email::new(raw).expect_err("must fail"),
            UserValidationError::InvalidEmail
        );
    }

    #[rstest]
    #[case("Kody", "kody")]
    #[case("UNDER_scored9", "under_scored9")]
    fn username_folds_to_lowercase(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(
            Username::new(raw).expect("valid username").as_ref(),
            expected
        );
    }

    #[rstest]
    #[case("ab", UserValidationError::UsernameTooShort { min: USERNAME_MIN })]
    #[case(
        "a_very_long_username_far_beyond",
        UserValidationError::UsernameTooLong { max: USERNAME_MAX }
    )]
    #[case("has space", UserValidationError::UsernameInvalidCharacters)]
    #[case("dash-ed", UserValidationError::UsernameInvalidCharacters)]
    fn username_rejects_malformed_input(
        #[case] raw: &str,
        #[case] expected: UserValidationError,
    ) {
        assert_eq!(Username::new(raw).expect_err("must fail"), expected);
    }

    #[rstest]
    fn create_stamps_id_and_timestamps() {
        let user = User::create(
            Email::new("a@example.com").expect("email"),
            Username::new("alice").expect("username"),
            Some("Alice".to_owned()),
        );
        assert_eq!(user.id.as_ref().len(), 24);
        assert_eq!(user.created_at, user.updated_at);
    }
}
