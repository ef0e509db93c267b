//! PostgreSQL-backed seeding adapter.
//!
//! Insert-only by design: the seeder targets a freshly migrated or reset
//! schema and never updates rows.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{RepositoryError, SeedRepository};
use crate::domain::{Note, Permission, RecordId, Role, User};

use super::error_map::{map_diesel_error, map_pool_error};
use super::models::{NoteRow, PermissionRow, RoleRow, UserRow};
use super::pool::DbPool;
use super::schema::{notes, passwords, permissions, role_permissions, roles, user_roles, users};

/// Diesel-backed [`SeedRepository`] implementation.
#[derive(Clone)]
pub struct DieselSeedRepository {
    pool: DbPool,
}

impl DieselSeedRepository {
    /// Create a new repository over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SeedRepository for DieselSeedRepository {
    async fn insert_role(&self, role: &Role) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(roles::table)
            .values(RoleRow::from_role(role, Utc::now()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn insert_permission(&self, permission: &Permission) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(permissions::table)
            .values(PermissionRow::from_permission(permission))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn grant_permission(
        &self,
        role_id: &RecordId,
        permission_id: &RecordId,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(role_permissions::table)
            .values((
                role_permissions::role_id.eq(role_id.as_ref()),
                role_permissions::permission_id.eq(permission_id.as_ref()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(users::table)
            .values(UserRow::from_user(user))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn insert_password(
        &self,
        user_id: &RecordId,
        hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(passwords::table)
            .values((
                passwords::hash.eq(hash),
                passwords::user_id.eq(user_id.as_ref()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn assign_role(
        &self,
        user_id: &RecordId,
        role_id: &RecordId,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(user_roles::table)
            .values((
                user_roles::user_id.eq(user_id.as_ref()),
                user_roles::role_id.eq(role_id.as_ref()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn insert_note(&self, note: &Note) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(notes::table)
            .values(NoteRow::from_note(note))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }
}
