//! Credential store port: users, password hashes, provider connections, and
//! the per-user profile image.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::auth::UserLookup;
use crate::domain::connection::Connection;
use crate::domain::export::UserExport;
use crate::domain::id::RecordId;
use crate::domain::note::{ImageData, NewImage};
use crate::domain::user::{User, UserListing, Username};

/// Operations against the credential store.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new user row.
    async fn create_user(&self, user: &User) -> Result<(), RepositoryError>;

    /// Insert the password row for a user.
    async fn create_password(&self, user_id: &RecordId, hash: &str) -> Result<(), RepositoryError>;

    /// Replace the stored hash; `false` when the user has no password row.
    async fn update_password(&self, user_id: &RecordId, hash: &str)
    -> Result<bool, RepositoryError>;

    /// Insert a provider connection row.
    async fn create_connection(&self, connection: &Connection) -> Result<(), RepositoryError>;

    /// Look up a connection by its unique provider pair.
    async fn find_connection(
        &self,
        provider_name: &str,
        provider_id: &str,
    ) -> Result<Option<Connection>, RepositoryError>;

    /// Look up a user by primary key.
    async fn find_user_by_id(&self, id: &RecordId) -> Result<Option<User>, RepositoryError>;

    /// Look up a user by exact username.
    async fn find_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError>;

    /// Look up a user whose username or email equals `target`.
    async fn find_user_by_username_or_email(
        &self,
        target: &str,
    ) -> Result<Option<User>, RepositoryError>;

    /// Load a user with their stored password hash, if any.
    async fn find_user_with_password(
        &self,
        lookup: &UserLookup,
    ) -> Result<Option<(User, Option<String>)>, RepositoryError>;

    /// Case-insensitive substring search against username or name, ordered by
    /// most-recently-updated-note descending, capped at 50 rows.
    async fn search_users(&self, term: &str) -> Result<Vec<UserListing>, RepositoryError>;

    /// Delete the user row; the store cascades to every dependent row.
    async fn delete_user(&self, id: &RecordId) -> Result<(), RepositoryError>;

    /// Replace the user's profile image (at most one per user).
    async fn set_user_image(
        &self,
        user_id: &RecordId,
        image: &NewImage,
    ) -> Result<(), RepositoryError>;

    /// Fetch a profile image payload by image id.
    async fn find_user_image(
        &self,
        image_id: &RecordId,
    ) -> Result<Option<ImageData>, RepositoryError>;

    /// Assemble the full export bundle for a user, blobs excluded. Roles are
    /// populated separately by the role store.
    async fn export_user_data(
        &self,
        id: &RecordId,
    ) -> Result<Option<UserExport>, RepositoryError>;
}
