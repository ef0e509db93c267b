//! Session store port.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::id::RecordId;
use crate::domain::session::Session;

/// Operations against the session store.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert a new session row.
    async fn create(&self, session: &Session) -> Result<(), RepositoryError>;

    /// Look up a session by id; liveness is the caller's concern.
    async fn find(&self, id: &RecordId) -> Result<Option<Session>, RepositoryError>;

    /// Delete a session row. Deleting an absent row is not an error.
    async fn delete(&self, id: &RecordId) -> Result<(), RepositoryError>;
}
