//! Authorization checks over the role/permission store.

use std::sync::Arc;

use serde_json::json;

use super::access::{PermissionSpec, Role};
use super::error::Error;
use super::id::RecordId;
use super::ports::AccessRepository;

/// Yes/no authorization checker.
#[derive(Clone)]
pub struct AccessControl {
    access: Arc<dyn AccessRepository>,
}

impl AccessControl {
    /// Create a checker over the given store.
    pub fn new(access: Arc<dyn AccessRepository>) -> Self {
        Self { access }
    }

    /// Fail with a 403-equivalent error unless one of the user's roles grants
    /// a permission matching the specifier. The failure payload carries the
    /// unmet permission.
    pub async fn require_permission(
        &self,
        user_id: &RecordId,
        spec: &PermissionSpec,
    ) -> Result<(), Error> {
        if self.access.has_permission(user_id, spec).await? {
            return Ok(());
        }
        Err(
            Error::forbidden(format!("Unauthorized: required permissions: {spec}"))
                .with_details(json!({ "requiredPermission": spec })),
        )
    }

    /// Fail with a 403-equivalent error unless the user holds the named role.
    pub async fn require_role(&self, user_id: &RecordId, role_name: &str) -> Result<(), Error> {
        if self.access.has_role(user_id, role_name).await? {
            return Ok(());
        }
        Err(
            Error::forbidden(format!("Unauthorized: required role: {role_name}"))
                .with_details(json!({ "requiredRole": role_name })),
        )
    }

    /// All roles assigned to a user.
    pub async fn roles_for_user(&self, user_id: &RecordId) -> Result<Vec<Role>, Error> {
        Ok(self.access.roles_for_user(user_id).await?)
    }
}
