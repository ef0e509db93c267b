//! Role/permission store port.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::access::{PermissionSpec, Role};
use crate::domain::id::RecordId;

/// Read operations against the role/permission store.
#[async_trait]
pub trait AccessRepository: Send + Sync {
    /// Whether any of the user's roles grants a permission matching the
    /// specifier. When the specifier lists access scopes, a row matching any
    /// one of them suffices.
    async fn has_permission(
        &self,
        user_id: &RecordId,
        spec: &PermissionSpec,
    ) -> Result<bool, RepositoryError>;

    /// Whether the user holds the named role.
    async fn has_role(&self, user_id: &RecordId, role_name: &str)
    -> Result<bool, RepositoryError>;

    /// All roles assigned to the user, for the export bundle.
    async fn roles_for_user(&self, user_id: &RecordId) -> Result<Vec<Role>, RepositoryError>;
}
