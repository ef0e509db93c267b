//! Authentication primitives: passwords, credentials, and hashing.
//!
//! Plaintext passwords travel wrapped in [`zeroize::Zeroizing`] and are never
//! persisted; hashing and verification are delegated to the `argon2` crate,
//! whose verifier compares digests in constant time.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use zeroize::Zeroizing;

use super::error::Error;
use super::id::RecordId;
use super::user::{Email, Username};

/// Minimum accepted password length.
pub const PASSWORD_MIN: usize = 6;
/// Maximum accepted password length.
pub const PASSWORD_MAX: usize = 100;

/// Validation errors for password input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordValidationError {
    /// Password was shorter than the minimum.
    #[error("password must be at least {min} characters")]
    TooShort { min: usize },
    /// Password exceeded the maximum.
    #[error("password must be at most {max} characters")]
    TooLong { max: usize },
}

/// Plaintext password held only in transit.
///
/// Retains caller-provided whitespace to avoid surprising credential
/// comparisons; the wrapped buffer is zeroed on drop.
#[derive(Clone)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Validate and wrap a plaintext password.
    pub fn new(password: impl Into<String>) -> Result<Self, PasswordValidationError> {
        let password = password.into();
        let length = password.chars().count();
        if length < PASSWORD_MIN {
            return Err(PasswordValidationError::TooShort { min: PASSWORD_MIN });
        }
        if length > PASSWORD_MAX {
            return Err(PasswordValidationError::TooLong { max: PASSWORD_MAX });
        }
        Ok(Self(Zeroizing::new(password)))
    }

    /// The wrapped plaintext, for hashing or verification only.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Validated login payload.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub username: Username,
    pub password: Password,
}

/// Signup payload for password-based accounts.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: Email,
    pub username: Username,
    pub name: Option<String>,
    pub password: Password,
}

/// Signup payload for accounts originating from an external provider.
#[derive(Debug, Clone)]
pub struct NewConnectedAccount {
    pub email: Email,
    pub username: Username,
    pub name: Option<String>,
    pub provider_name: String,
    pub provider_id: String,
}

/// Lookup key for password verification: either the stored username or the
/// user id.
#[derive(Debug, Clone)]
pub enum UserLookup {
    Username(Username),
    Id(RecordId),
}

/// Hash a plaintext password with a fresh random salt.
pub fn hash_password(password: &Password) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.expose().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| Error::internal(format!("password hashing failed: {err}")))
}

/// Verify a plaintext password against a stored hash.
///
/// An unparsable stored hash counts as a mismatch rather than an error so
/// callers keep the single "invalid credentials" failure path.
pub fn verify_password(stored_hash: &str, password: &Password) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.expose().as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
