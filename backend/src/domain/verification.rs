//! Persisted verification challenges for 2FA and account recovery.
//!
//! This module stores the parameters a time-based one-time-code algorithm
//! needs (secret, algorithm, digit count, period, character set) and
//! delegates generation and validation to the `totp-rs` crate. At most one
//! verification of a given kind exists per target; the store enforces the
//! uniqueness.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use totp_rs::{Algorithm, Secret, TOTP};

use super::error::Error;
use super::id::RecordId;

/// What a verification challenge proves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationKind {
    /// Active two-factor login challenge.
    TwoFactor,
    /// Pending two-factor enrolment, promoted to [`Self::TwoFactor`] once the
    /// user proves possession of the secret.
    TwoFactorSetup,
    /// Password-reset code delivered out of band.
    ResetPassword,
}

impl VerificationKind {
    /// Stable string form used as the `type` column value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TwoFactor => "2fa",
            Self::TwoFactorSetup => "2fa-setup",
            Self::ResetPassword => "reset-password",
        }
    }
}

impl fmt::Display for VerificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognised kind strings coming from the store or a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown verification kind: {0}")]
pub struct UnknownVerificationKind(pub String);

impl FromStr for VerificationKind {
    type Err = UnknownVerificationKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2fa" => Ok(Self::TwoFactor),
            "2fa-setup" => Ok(Self::TwoFactorSetup),
            "reset-password" => Ok(Self::ResetPassword),
            other => Err(UnknownVerificationKind(other.to_owned())),
        }
    }
}

/// Validity window for password-reset codes.
const RESET_CODE_TTL_MINUTES: i64 = 10;

/// Persisted verification challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub id: RecordId,
    pub kind: VerificationKind,
    /// What the challenge is about: a user id for 2FA, an email or username
    /// for password reset.
    pub target: String,
    /// Base32-encoded shared secret.
    pub secret: String,
    pub algorithm: String,
    pub digits: u32,
    pub period: u64,
    pub char_set: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Verification {
    /// Generate a fresh challenge for `target`.
    ///
    /// Two-factor challenges use the conventional 30-second step and never
    /// expire on their own; reset codes get a 10-minute step and a matching
    /// absolute expiry so a delivered code stays valid for the whole window.
    pub fn generate(kind: VerificationKind, target: impl Into<String>, now: DateTime<Utc>) -> Self {
        let (period, expires_at) = match kind {
            VerificationKind::TwoFactor | VerificationKind::TwoFactorSetup => (30, None),
            VerificationKind::ResetPassword => (
                60 * u64::try_from(RESET_CODE_TTL_MINUTES).unwrap_or(10),
                Some(now + Duration::minutes(RESET_CODE_TTL_MINUTES)),
            ),
        };
        let secret = Secret::generate_secret();
        Self {
            id: RecordId::random(),
            kind,
            target: target.into(),
            secret: secret.to_encoded().to_string(),
            algorithm: "SHA1".to_owned(),
            digits: 6,
            period,
            char_set: "0123456789".to_owned(),
            expires_at,
            created_at: now,
        }
    }

    /// Whether the challenge has passed its absolute expiry.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    fn totp(&self) -> Result<TOTP, Error> {
        let algorithm = match self.algorithm.as_str() {
            "SHA1" => Algorithm::SHA1,
            "SHA256" => Algorithm::SHA256,
            "SHA512" => Algorithm::SHA512,
            other => {
                return Err(Error::internal(format!(
                    "unsupported verification algorithm: {other}"
                )));
            }
        };
        let secret = Secret::Encoded(self.secret.clone())
            .to_bytes()
            .map_err(|err| Error::internal(format!("stored secret is unreadable: {err:?}")))?;
        TOTP::new(
            algorithm,
            usize::try_from(self.digits)
                .map_err(|_| Error::internal("digit count out of range"))?,
            1,
            self.period,
            secret,
        )
        .map_err(|err| Error::internal(format!("verification parameters rejected: {err:?}")))
    }

    /// Check a submitted code against this challenge at `now`.
    ///
    /// Expired challenges always fail; otherwise validation is delegated to
    /// the TOTP implementation with one step of clock skew.
    pub fn verify_code(&self, code: &str, now: DateTime<Utc>) -> Result<bool, Error> {
        if self.is_expired(now) {
            return Ok(false);
        }
        let timestamp = u64::try_from(now.timestamp())
            .map_err(|_| Error::internal("verification time predates the epoch"))?;
        Ok(self.totp()?.check(code, timestamp))
    }

    /// Produce the code currently valid for this challenge.
    ///
    /// Used to hand reset codes to the delivery channel.
    pub fn current_code(&self, now: DateTime<Utc>) -> Result<String, Error> {
        let timestamp = u64::try_from(now.timestamp())
            .map_err(|_| Error::internal("verification time predates the epoch"))?;
        Ok(self.totp()?.generate(timestamp))
    }
}
