//! Notes and their binary image attachments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::id::RecordId;

/// Validation errors for note payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NoteValidationError {
    /// Title was empty once trimmed.
    #[error("title must not be empty")]
    EmptyTitle,
    /// Title exceeded the maximum length.
    #[error("title must be at most {max} characters")]
    TitleTooLong { max: usize },
    /// Content was empty once trimmed.
    #[error("content must not be empty")]
    EmptyContent,
    /// Content exceeded the maximum length.
    #[error("content must be at most {max} characters")]
    ContentTooLong { max: usize },
}

/// Maximum note title length.
pub const TITLE_MAX: usize = 100;
/// Maximum note content length.
pub const CONTENT_MAX: usize = 10_000;

/// Validate a title/content pair, returning trimmed-length failures.
pub fn validate_note_body(title: &str, content: &str) -> Result<(), NoteValidationError> {
    if title.trim().is_empty() {
        return Err(NoteValidationError::EmptyTitle);
    }
    if title.chars().count() > TITLE_MAX {
        return Err(NoteValidationError::TitleTooLong { max: TITLE_MAX });
    }
    if content.trim().is_empty() {
        return Err(NoteValidationError::EmptyContent);
    }
    if content.chars().count() > CONTENT_MAX {
        return Err(NoteValidationError::ContentTooLong { max: CONTENT_MAX });
    }
    Ok(())
}

/// Persisted note owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[schema(value_type = String, example = "d27a197e")]
    pub id: RecordId,
    #[schema(example = "Basic Koala Facts")]
    pub title: String,
    pub content: String,
    #[schema(value_type = String)]
    pub owner_id: RecordId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Build a fresh note with a generated id and current timestamps.
    pub fn create(owner_id: RecordId, title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::random(),
            title: title.into(),
            content: content.into(),
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Image attributes without the binary payload, used in listings and the
/// user-data export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    #[schema(value_type = String)]
    pub id: RecordId,
    pub alt_text: Option<String>,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full image row fetched for a binary response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub id: RecordId,
    pub content_type: String,
    pub blob: Vec<u8>,
}

/// A new image attachment about to be written.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub id: RecordId,
    pub alt_text: Option<String>,
    pub content_type: String,
    pub blob: Vec<u8>,
}

impl NewImage {
    /// Wrap uploaded bytes with a generated id.
    pub fn from_upload(
        alt_text: Option<String>,
        content_type: impl Into<String>,
        blob: Vec<u8>,
    ) -> Self {
        Self {
            id: RecordId::random(),
            alt_text,
            content_type: content_type.into(),
            blob,
        }
    }
}
