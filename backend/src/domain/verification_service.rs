//! Verification challenge lifecycle: create on request, validate, delete on
//! disable.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::error::Error;
use super::id::RecordId;
use super::ports::VerificationRepository;
use super::verification::{Verification, VerificationKind};

/// Service over the verification store.
#[derive(Clone)]
pub struct VerificationService {
    verifications: Arc<dyn VerificationRepository>,
}

impl VerificationService {
    /// Create a service over the given store.
    pub fn new(verifications: Arc<dyn VerificationRepository>) -> Self {
        Self { verifications }
    }

    /// Start two-factor enrolment for a user, replacing any earlier pending
    /// setup. The returned challenge carries the secret the user must load
    /// into their authenticator app.
    pub async fn begin_two_factor_setup(
        &self,
        user_id: &RecordId,
    ) -> Result<Verification, Error> {
        let verification =
            Verification::generate(VerificationKind::TwoFactorSetup, user_id.as_ref(), Utc::now());
        self.verifications.upsert(&verification).await?;
        Ok(verification)
    }

    /// Promote a pending setup to active two-factor once the user proves
    /// possession of the secret. Returns `false` when there is no pending
    /// setup or the code does not validate.
    pub async fn confirm_two_factor(
        &self,
        user_id: &RecordId,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let Some(setup) = self
            .verifications
            .find(user_id.as_ref(), VerificationKind::TwoFactorSetup)
            .await?
        else {
            return Ok(false);
        };
        if !setup.verify_code(code, now)? {
            return Ok(false);
        }

        let active = Verification {
            id: RecordId::random(),
            kind: VerificationKind::TwoFactor,
            ..setup
        };
        self.verifications.upsert(&active).await?;
        self.verifications
            .delete(user_id.as_ref(), VerificationKind::TwoFactorSetup)
            .await?;
        Ok(true)
    }

    /// Create a password-reset challenge for a target and return the code
    /// currently valid for it, for delivery over an out-of-band channel.
    pub async fn begin_password_reset(
        &self,
        target: &str,
        now: DateTime<Utc>,
    ) -> Result<(Verification, String), Error> {
        let verification = Verification::generate(VerificationKind::ResetPassword, target, now);
        let code = verification.current_code(now)?;
        self.verifications.upsert(&verification).await?;
        Ok((verification, code))
    }

    /// Validate a submitted code for a target and kind.
    ///
    /// Password-reset challenges are single-use: a successful validation
    /// deletes the row. Two-factor challenges persist across logins.
    pub async fn verify(
        &self,
        kind: VerificationKind,
        target: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let Some(verification) = self.verifications.find(target, kind).await? else {
            return Ok(false);
        };
        if !verification.verify_code(code, now)? {
            return Ok(false);
        }
        if kind == VerificationKind::ResetPassword {
            self.verifications.delete(target, kind).await?;
        }
        Ok(true)
    }

    /// Whether the user has active two-factor login.
    pub async fn has_two_factor(&self, user_id: &RecordId) -> Result<bool, Error> {
        Ok(self
            .verifications
            .find(user_id.as_ref(), VerificationKind::TwoFactor)
            .await?
            .is_some())
    }

    /// Delete the active two-factor challenge for a user.
    pub async fn disable_two_factor(&self, user_id: &RecordId) -> Result<(), Error> {
        self.verifications
            .delete(user_id.as_ref(), VerificationKind::TwoFactor)
            .await?;
        Ok(())
    }
}
