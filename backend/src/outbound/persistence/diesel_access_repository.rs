//! PostgreSQL-backed role/permission store adapter.
//!
//! The permission check is one parametrised join across
//! user_roles → roles → role_permissions → permissions, limited to a single
//! row; presence of any row is the grant.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AccessRepository, RepositoryError};
use crate::domain::{PermissionSpec, RecordId, Role};

use super::error_map::{map_diesel_error, map_pool_error};
use super::models::RoleRow;
use super::pool::DbPool;
use super::schema::{permissions, role_permissions, roles, user_roles};

/// Diesel-backed [`AccessRepository`] implementation.
#[derive(Clone)]
pub struct DieselAccessRepository {
    pool: DbPool,
}

impl DieselAccessRepository {
    /// Create a new repository over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessRepository for DieselAccessRepository {
    async fn has_permission(
        &self,
        user_id: &RecordId,
        spec: &PermissionSpec,
    ) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let base = user_roles::table
            .inner_join(roles::table)
            .inner_join(
                role_permissions::table.on(role_permissions::role_id.eq(user_roles::role_id)),
            )
            .inner_join(
                permissions::table.on(permissions::id.eq(role_permissions::permission_id)),
            )
            .filter(user_roles::user_id.eq(user_id.as_ref()))
            .filter(permissions::action.eq(&spec.action))
            .filter(permissions::entity.eq(&spec.entity));

        // Membership in the access list is OR semantics: any one scope grants.
        let matched: Option<String> = match &spec.access {
            Some(scopes) => base
                .filter(permissions::access.eq_any(scopes))
                .select(user_roles::user_id)
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?,
            None => base
                .select(user_roles::user_id)
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?,
        };
        Ok(matched.is_some())
    }

    async fn has_role(
        &self,
        user_id: &RecordId,
        role_name: &str,
    ) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let matched: Option<String> = user_roles::table
            .inner_join(roles::table)
            .filter(user_roles::user_id.eq(user_id.as_ref()))
            .filter(roles::name.eq(role_name))
            .select(user_roles::user_id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(matched.is_some())
    }

    async fn roles_for_user(&self, user_id: &RecordId) -> Result<Vec<Role>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<RoleRow> = user_roles::table
            .inner_join(roles::table)
            .filter(user_roles::user_id.eq(user_id.as_ref()))
            .select(RoleRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(RoleRow::into_role).collect()
    }
}
