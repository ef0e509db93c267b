//! Note/image store port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::RepositoryError;
use crate::domain::id::RecordId;
use crate::domain::note::{ImageData, ImageMetadata, NewImage, Note};

/// Operations against the note store and its image attachments.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a new note row.
    async fn create(&self, note: &Note) -> Result<(), RepositoryError>;

    /// Update title/content of a note owned by `owner_id`; `false` when no
    /// such owned note exists. Last writer wins.
    async fn update(
        &self,
        id: &RecordId,
        owner_id: &RecordId,
        title: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    /// Look up a note by id.
    async fn find(&self, id: &RecordId) -> Result<Option<Note>, RepositoryError>;

    /// All notes owned by a user, most recently updated first.
    async fn list_for_owner(&self, owner_id: &RecordId) -> Result<Vec<Note>, RepositoryError>;

    /// Delete a note; `false` when it did not exist. The store cascades to
    /// its images.
    async fn delete(&self, id: &RecordId) -> Result<bool, RepositoryError>;

    /// Attach a new image to a note.
    async fn attach_image(
        &self,
        note_id: &RecordId,
        image: &NewImage,
    ) -> Result<(), RepositoryError>;

    /// Remove every image of the note whose id is not in `keep`.
    async fn remove_images_except(
        &self,
        note_id: &RecordId,
        keep: &[RecordId],
    ) -> Result<(), RepositoryError>;

    /// Metadata for a note's images, blobs excluded.
    async fn list_images(&self, note_id: &RecordId)
    -> Result<Vec<ImageMetadata>, RepositoryError>;

    /// Fetch an image payload by image id.
    async fn find_image(&self, image_id: &RecordId)
    -> Result<Option<ImageData>, RepositoryError>;
}
