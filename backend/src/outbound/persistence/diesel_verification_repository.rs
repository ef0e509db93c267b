//! PostgreSQL-backed verification store adapter.
//!
//! The (target, type) uniqueness lives in the schema; `upsert` rides on it
//! with an `ON CONFLICT … DO UPDATE` so a new challenge always replaces the
//! previous one atomically.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{RepositoryError, VerificationRepository};
use crate::domain::{Verification, VerificationKind};

use super::error_map::{map_diesel_error, map_pool_error};
use super::models::VerificationRow;
use super::pool::DbPool;
use super::schema::verifications;

/// Diesel-backed [`VerificationRepository`] implementation.
#[derive(Clone)]
pub struct DieselVerificationRepository {
    pool: DbPool,
}

impl DieselVerificationRepository {
    /// Create a new repository over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationRepository for DieselVerificationRepository {
    async fn upsert(&self, verification: &Verification) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = VerificationRow::from_verification(verification)?;
        diesel::insert_into(verifications::table)
            .values(&row)
            .on_conflict((verifications::target, verifications::kind))
            .do_update()
            .set((
                verifications::id.eq(&row.id),
                verifications::created_at.eq(row.created_at),
                verifications::secret.eq(&row.secret),
                verifications::algorithm.eq(&row.algorithm),
                verifications::digits.eq(row.digits),
                verifications::period.eq(row.period),
                verifications::char_set.eq(&row.char_set),
                verifications::expires_at.eq(row.expires_at),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find(
        &self,
        target: &str,
        kind: VerificationKind,
    ) -> Result<Option<Verification>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<VerificationRow> = verifications::table
            .filter(verifications::target.eq(target))
            .filter(verifications::kind.eq(kind.as_str()))
            .select(VerificationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(VerificationRow::into_verification).transpose()
    }

    async fn delete(
        &self,
        target: &str,
        kind: VerificationKind,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(
            verifications::table
                .filter(verifications::target.eq(target))
                .filter(verifications::kind.eq(kind.as_str())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(())
    }
}
