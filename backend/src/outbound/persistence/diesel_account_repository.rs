//! PostgreSQL-backed credential store adapter.
//!
//! A thin translation layer: every method checks out a pooled connection,
//! runs one or a few statements, and maps rows into domain entities. No
//! business logic lives here.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sql_types::{Nullable, Text};
use diesel_async::RunQueryDsl;

use crate::domain::auth::UserLookup;
use crate::domain::ports::{AccountRepository, RepositoryError};
use crate::domain::{
    Connection as DomainConnection, ImageData, NewImage, NoteExport, RecordId, User, UserExport,
    UserListing, Username,
};

use super::error_map::{map_diesel_error, map_pool_error};
use super::models::{
    ConnectionRow, NewUserImageRow, NoteImageMetaRow, NoteRow, SessionRow, UserImageDataRow,
    UserImageMetaRow, UserRow, record_id,
};
use super::pool::DbPool;
use super::schema::{connections, note_images, notes, passwords, sessions, user_images, users};

/// Diesel-backed [`AccountRepository`] implementation.
#[derive(Clone)]
pub struct DieselAccountRepository {
    pool: DbPool,
}

impl DieselAccountRepository {
    /// Create a new repository over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Raw row shape of the user-search aggregation query.
#[derive(QueryableByName)]
struct SearchRow {
    #[diesel(sql_type = Text)]
    id: String,
    #[diesel(sql_type = Text)]
    username: String,
    #[diesel(sql_type = Nullable<Text>)]
    name: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    image_id: Option<String>,
}

const SEARCH_SQL: &str = "\
SELECT u.id, u.username, u.name, ui.id AS image_id \
FROM users u \
LEFT JOIN user_images ui ON ui.user_id = u.id \
LEFT JOIN notes n ON n.owner_id = u.id \
WHERE u.username LIKE $1 OR LOWER(COALESCE(u.name, '')) LIKE $1 \
GROUP BY u.id, u.username, u.name, ui.id \
ORDER BY MAX(n.updated_at) DESC NULLS LAST \
LIMIT 50";

#[async_trait]
impl AccountRepository for DieselAccountRepository {
    async fn create_user(&self, user: &User) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(users::table)
            .values(UserRow::from_user(user))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn create_password(
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

    async fn update_password(
        &self,
        user_id: &RecordId,
        hash: &str,
    ) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            passwords::table.filter(passwords::user_id.eq(user_id.as_ref())),
        )
        .set(passwords::hash.eq(hash))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn create_connection(
        &self,
        connection: &DomainConnection,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(connections::table)
            .values(ConnectionRow::from_connection(connection))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find_connection(
        &self,
        provider_name: &str,
        provider_id: &str,
    ) -> Result<Option<DomainConnection>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ConnectionRow> = connections::table
            .filter(connections::provider_name.eq(provider_name))
            .filter(connections::provider_id.eq(provider_id))
            .select(ConnectionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(ConnectionRow::into_connection).transpose()
    }

    async fn find_user_by_id(&self, id: &RecordId) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(UserRow::into_user).transpose()
    }

    async fn find_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::username.eq(username.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(UserRow::into_user).transpose()
    }

    async fn find_user_by_username_or_email(
        &self,
        target: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::username.eq(target).or(users::email.eq(target)))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(UserRow::into_user).transpose()
    }

    async fn find_user_with_password(
        &self,
        lookup: &UserLookup,
    ) -> Result<Option<(User, Option<String>)>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<(UserRow, Option<String>)> = match lookup {
            UserLookup::Username(username) => users::table
                .left_join(passwords::table)
                .filter(users::username.eq(username.as_ref()))
                .select((UserRow::as_select(), passwords::hash.nullable()))
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?,
            UserLookup::Id(id) => users::table
                .left_join(passwords::table)
                .filter(users::id.eq(id.as_ref()))
                .select((UserRow::as_select(), passwords::hash.nullable()))
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?,
        };
        row.map(|(user, hash)| Ok((user.into_user()?, hash)))
            .transpose()
    }

    async fn search_users(&self, term: &str) -> Result<Vec<UserListing>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let pattern = format!("%{}%", term.to_lowercase());
        let rows: Vec<SearchRow> = diesel::sql_query(SEARCH_SQL)
            .bind::<Text, _>(pattern)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|row| {
                Ok(UserListing {
                    id: record_id(row.id, "user id")?,
                    username: Username::new(row.username)
                        .map_err(|error| RepositoryError::query(error.to_string()))?,
                    name: row.name,
                    image_id: row
                        .image_id
                        .map(|id| record_id(id, "image id"))
                        .transpose()?,
                })
            })
            .collect()
    }

    async fn delete_user(&self, id: &RecordId) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // Dependent rows go with the user via the schema's cascades.
        diesel::delete(users::table.filter(users::id.eq(id.as_ref())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn set_user_image(
        &self,
        user_id: &RecordId,
        image: &NewImage,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(user_images::table.filter(user_images::user_id.eq(user_id.as_ref())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let now = Utc::now();
        diesel::insert_into(user_images::table)
            .values(NewUserImageRow {
                id: image.id.as_ref().to_owned(),
                alt_text: image.alt_text.clone(),
                content_type: image.content_type.clone(),
                blob: image.blob.clone(),
                created_at: now,
                updated_at: now,
                user_id: user_id.as_ref().to_owned(),
            })
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find_user_image(
        &self,
        image_id: &RecordId,
    ) -> Result<Option<ImageData>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserImageDataRow> = user_images::table
            .filter(user_images::id.eq(image_id.as_ref()))
            .select(UserImageDataRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|row| {
            Ok(ImageData {
                id: record_id(row.id, "image id")?,
                content_type: row.content_type,
                blob: row.blob,
            })
        })
        .transpose()
    }

    async fn export_user_data(
        &self,
        id: &RecordId,
    ) -> Result<Option<UserExport>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let user_row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(user_row) = user_row else {
            return Ok(None);
        };

        let image_row: Option<UserImageMetaRow> = user_images::table
            .filter(user_images::user_id.eq(id.as_ref()))
            .select(UserImageMetaRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        let note_rows: Vec<NoteRow> = notes::table
            .filter(notes::owner_id.eq(id.as_ref()))
            .order(notes::updated_at.desc())
            .select(NoteRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let note_ids: Vec<String> = note_rows.iter().map(|row| row.id.clone()).collect();
        let image_rows: Vec<NoteImageMetaRow> = note_images::table
            .filter(note_images::note_id.eq_any(&note_ids))
            .select(NoteImageMetaRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let session_rows: Vec<SessionRow> = sessions::table
            .filter(sessions::user_id.eq(id.as_ref()))
            .select(SessionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let notes = note_rows
            .into_iter()
            .map(|note_row| {
                let note_id = note_row.id.clone();
                let images = image_rows
                    .iter()
                    .filter(|image| image.note_id == note_id)
                    .cloned()
                    .map(NoteImageMetaRow::into_metadata)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(NoteExport {
                    note: note_row.into_note()?,
                    images,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(Some(UserExport {
            user: user_row.into_user()?,
            image: image_row.map(UserImageMetaRow::into_metadata).transpose()?,
            notes,
            sessions: session_rows
                .into_iter()
                .map(SessionRow::into_session)
                .collect::<Result<Vec<_>, _>>()?,
            roles: Vec::new(),
        }))
    }
}
