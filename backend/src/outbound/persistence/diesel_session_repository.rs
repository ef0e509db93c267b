//! PostgreSQL-backed session store adapter.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{RepositoryError, SessionRepository};
use crate::domain::{RecordId, Session};

use super::error_map::{map_diesel_error, map_pool_error};
use super::models::SessionRow;
use super::pool::DbPool;
use super::schema::sessions;

/// Diesel-backed [`SessionRepository`] implementation.
#[derive(Clone)]
pub struct DieselSessionRepository {
    pool: DbPool,
}

impl DieselSessionRepository {
    /// Create a new repository over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for DieselSessionRepository {
    async fn create(&self, session: &Session) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let now = Utc::now();
        diesel::insert_into(sessions::table)
            .values((
                sessions::id.eq(session.id.as_ref()),
                sessions::expiration_date.eq(session.expiration_date),
                sessions::created_at.eq(now),
                sessions::updated_at.eq(now),
                sessions::user_id.eq(session.user_id.as_ref()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find(&self, id: &RecordId) -> Result<Option<Session>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<SessionRow> = sessions::table
            .filter(sessions::id.eq(id.as_ref()))
            .select(SessionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(SessionRow::into_session).transpose()
    }

    async fn delete(&self, id: &RecordId) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(sessions::table.filter(sessions::id.eq(id.as_ref())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }
}
