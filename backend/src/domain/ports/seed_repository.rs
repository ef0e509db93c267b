//! Seeding port used by the operational seed tooling.
//!
//! Deliberately insert-only: the seeder never updates existing rows, it
//! assumes a freshly migrated or reset schema.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::access::{Permission, Role};
use crate::domain::id::RecordId;
use crate::domain::note::Note;
use crate::domain::user::User;

/// Insert operations for bulk seeding.
#[async_trait]
pub trait SeedRepository: Send + Sync {
    /// Insert a role row.
    async fn insert_role(&self, role: &Role) -> Result<(), RepositoryError>;

    /// Insert a permission row.
    async fn insert_permission(&self, permission: &Permission) -> Result<(), RepositoryError>;

    /// Link a permission to a role.
    async fn grant_permission(
        &self,
        role_id: &RecordId,
        permission_id: &RecordId,
    ) -> Result<(), RepositoryError>;

    /// Insert a user row.
    async fn insert_user(&self, user: &User) -> Result<(), RepositoryError>;

    /// Insert a password row.
    async fn insert_password(&self, user_id: &RecordId, hash: &str)
    -> Result<(), RepositoryError>;

    /// Link a role to a user.
    async fn assign_role(
        &self,
        user_id: &RecordId,
        role_id: &RecordId,
    ) -> Result<(), RepositoryError>;

    /// Insert a note row.
    async fn insert_note(&self, note: &Note) -> Result<(), RepositoryError>;
}
