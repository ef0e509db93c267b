//! Verification store port.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::verification::{Verification, VerificationKind};

/// Operations against the verification store. At most one row exists per
/// (target, kind) pair; `upsert` replaces any previous challenge.
#[async_trait]
pub trait VerificationRepository: Send + Sync {
    /// Insert or replace the challenge for its (target, kind) pair.
    async fn upsert(&self, verification: &Verification) -> Result<(), RepositoryError>;

    /// Look up the active challenge for a target and kind.
    async fn find(
        &self,
        target: &str,
        kind: VerificationKind,
    ) -> Result<Option<Verification>, RepositoryError>;

    /// Delete the challenge for a target and kind. Deleting an absent row is
    /// not an error.
    async fn delete(&self, target: &str, kind: VerificationKind) -> Result<(), RepositoryError>;
}
