//! PostgreSQL-backed note/image store adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{NoteRepository, RepositoryError};
use crate::domain::{ImageData, ImageMetadata, NewImage, Note, RecordId};

use super::error_map::{map_diesel_error, map_pool_error};
use super::models::{NewNoteImageRow, NoteImageDataRow, NoteImageMetaRow, NoteRow, record_id};
use super::pool::DbPool;
use super::schema::{note_images, notes};

/// Diesel-backed [`NoteRepository`] implementation.
#[derive(Clone)]
pub struct DieselNoteRepository {
    pool: DbPool,
}

impl DieselNoteRepository {
    /// Create a new repository over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteRepository for DieselNoteRepository {
    async fn create(&self, note: &Note) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(notes::table)
            .values(NoteRow::from_note(note))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn update(
        &self,
        id: &RecordId,
        owner_id: &RecordId,
        title: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            notes::table
                .filter(notes::id.eq(id.as_ref()))
                .filter(notes::owner_id.eq(owner_id.as_ref())),
        )
        .set((
            notes::title.eq(title),
            notes::content.eq(content),
            notes::updated_at.eq(now),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn find(&self, id: &RecordId) -> Result<Option<Note>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<NoteRow> = notes::table
            .filter(notes::id.eq(id.as_ref()))
            .select(NoteRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(NoteRow::into_note).transpose()
    }

    async fn list_for_owner(&self, owner_id: &RecordId) -> Result<Vec<Note>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<NoteRow> = notes::table
            .filter(notes::owner_id.eq(owner_id.as_ref()))
            .order(notes::updated_at.desc())
            .select(NoteRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(NoteRow::into_note).collect()
    }

    async fn delete(&self, id: &RecordId) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // Images go with the note via the schema's cascade.
        let deleted = diesel::delete(notes::table.filter(notes::id.eq(id.as_ref())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn attach_image(
        &self,
        note_id: &RecordId,
        image: &NewImage,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let now = Utc::now();
        diesel::insert_into(note_images::table)
            .values(NewNoteImageRow {
                id: image.id.as_ref().to_owned(),
                alt_text: image.alt_text.clone(),
                content_type: image.content_type.clone(),
                blob: image.blob.clone(),
                created_at: now,
                updated_at: now,
                note_id: note_id.as_ref().to_owned(),
            })
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn remove_images_except(
        &self,
        note_id: &RecordId,
        keep: &[RecordId],
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let keep_ids: Vec<&str> = keep.iter().map(AsRef::as_ref).collect();
        diesel::delete(
            note_images::table
                .filter(note_images::note_id.eq(note_id.as_ref()))
                .filter(note_images::id.ne_all(keep_ids)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn list_images(
        &self,
        note_id: &RecordId,
    ) -> Result<Vec<ImageMetadata>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<NoteImageMetaRow> = note_images::table
            .filter(note_images::note_id.eq(note_id.as_ref()))
            .order(note_images::created_at.asc())
            .select(NoteImageMetaRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(NoteImageMetaRow::into_metadata).collect()
    }

    async fn find_image(
        &self,
        image_id: &RecordId,
    ) -> Result<Option<ImageData>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<NoteImageDataRow> = note_images::table
            .filter(note_images::id.eq(image_id.as_ref()))
            .select(NoteImageDataRow::as_select())
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
}
