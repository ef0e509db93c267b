//! Diesel row structs and their domain conversions.
//!
//! Rows are internal to the persistence layer; adapters translate between
//! them and domain entities, surfacing malformed stored values as query
//! errors rather than panicking.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::ports::RepositoryError;
use crate::domain::{
    Connection as DomainConnection, ImageMetadata, Note, Permission, RecordId, Role, Session,
    User, Verification, VerificationKind,
};

use super::schema::{
    connections, note_images, notes, permissions, roles, sessions, user_images, users,
    verifications,
};

pub(crate) fn bad_row(what: &str, error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::query(format!("stored {what} is malformed: {error}"))
}

pub(crate) fn record_id(raw: String, what: &str) -> Result<RecordId, RepositoryError> {
    RecordId::new(raw).map_err(|error| bad_row(what, error))
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub username: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.as_ref().to_owned(),
            email: user.email.as_ref().to_owned(),
            username: user.username.as_ref().to_owned(),
            name: user.name.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn into_user(self) -> Result<User, RepositoryError> {
        Ok(User {
            id: record_id(self.id, "user id")?,
            email: self
                .email
                .try_into()
                .map_err(|error| bad_row("email", error))?,
            username: self
                .username
                .try_into()
                .map_err(|error| bad_row("username", error))?,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SessionRow {
    pub id: String,
    pub expiration_date: DateTime<Utc>,
    pub user_id: String,
}

impl SessionRow {
    pub fn into_session(self) -> Result<Session, RepositoryError> {
        Ok(Session {
            id: record_id(self.id, "session id")?,
            user_id: record_id(self.user_id, "session user id")?,
            expiration_date: self.expiration_date,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = connections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ConnectionRow {
    pub id: String,
    pub provider_name: String,
    pub provider_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: String,
}

impl ConnectionRow {
    pub fn from_connection(connection: &DomainConnection) -> Self {
        Self {
            id: connection.id.as_ref().to_owned(),
            provider_name: connection.provider_name.clone(),
            provider_id: connection.provider_id.clone(),
            created_at: connection.created_at,
            updated_at: connection.updated_at,
            user_id: connection.user_id.as_ref().to_owned(),
        }
    }

    pub fn into_connection(self) -> Result<DomainConnection, RepositoryError> {
        Ok(DomainConnection {
            id: record_id(self.id, "connection id")?,
            provider_name: self.provider_name,
            provider_id: self.provider_id,
            user_id: record_id(self.user_id, "connection user id")?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RoleRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoleRow {
    pub fn from_role(role: &Role, now: DateTime<Utc>) -> Self {
        Self {
            id: role.id.as_ref().to_owned(),
            name: role.name.clone(),
            description: role.description.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_role(self) -> Result<Role, RepositoryError> {
        Ok(Role {
            id: record_id(self.id, "role id")?,
            name: self.name,
            description: self.description,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = permissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PermissionRow {
    pub id: String,
    pub action: String,
    pub entity: String,
    pub access: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PermissionRow {
    pub fn from_permission(permission: &Permission) -> Self {
        Self {
            id: permission.id.as_ref().to_owned(),
            action: permission.action.clone(),
            entity: permission.entity.clone(),
            access: permission.access.clone(),
            description: permission.description.clone(),
            created_at: permission.created_at,
            updated_at: permission.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = notes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NoteRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_id: String,
}

impl NoteRow {
    pub fn from_note(note: &Note) -> Self {
        Self {
            id: note.id.as_ref().to_owned(),
            title: note.title.clone(),
            content: note.content.clone(),
            created_at: note.created_at,
            updated_at: note.updated_at,
            owner_id: note.owner_id.as_ref().to_owned(),
        }
    }

    pub fn into_note(self) -> Result<Note, RepositoryError> {
        Ok(Note {
            id: record_id(self.id, "note id")?,
            title: self.title,
            content: self.content,
            owner_id: record_id(self.owner_id, "note owner id")?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Image attributes without the payload, shared by both image tables.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = note_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NoteImageMetaRow {
    pub id: String,
    pub alt_text: Option<String>,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub note_id: String,
}

impl NoteImageMetaRow {
    pub fn into_metadata(self) -> Result<ImageMetadata, RepositoryError> {
        Ok(ImageMetadata {
            id: record_id(self.id, "image id")?,
            alt_text: self.alt_text,
            content_type: self.content_type,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = user_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserImageMetaRow {
    pub id: String,
    pub alt_text: Option<String>,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserImageMetaRow {
    pub fn into_metadata(self) -> Result<ImageMetadata, RepositoryError> {
        Ok(ImageMetadata {
            id: record_id(self.id, "image id")?,
            alt_text: self.alt_text,
            content_type: self.content_type,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = note_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewNoteImageRow {
    pub id: String,
    pub alt_text: Option<String>,
    pub content_type: String,
    pub blob: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub note_id: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewUserImageRow {
    pub id: String,
    pub alt_text: Option<String>,
    pub content_type: String,
    pub blob: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: String,
}

/// Payload projection for binary fetches from either image table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = note_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NoteImageDataRow {
    pub id: String,
    pub content_type: String,
    pub blob: Vec<u8>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = user_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserImageDataRow {
    pub id: String,
    pub content_type: String,
    pub blob: Vec<u8>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = verifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VerificationRow {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub kind: String,
    pub target: String,
    pub secret: String,
    pub algorithm: String,
    pub digits: i32,
    pub period: i64,
    pub char_set: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl VerificationRow {
    pub fn from_verification(verification: &Verification) -> Result<Self, RepositoryError> {
        Ok(Self {
            id: verification.id.as_ref().to_owned(),
            created_at: verification.created_at,
            kind: verification.kind.as_str().to_owned(),
            target: verification.target.clone(),
            secret: verification.secret.clone(),
            algorithm: verification.algorithm.clone(),
            digits: i32::try_from(verification.digits)
                .map_err(|error| bad_row("digit count", error))?,
            period: i64::try_from(verification.period)
                .map_err(|error| bad_row("period", error))?,
            char_set: verification.char_set.clone(),
            expires_at: verification.expires_at,
        })
    }

    pub fn into_verification(self) -> Result<Verification, RepositoryError> {
        let kind: VerificationKind = self
            .kind
            .parse()
            .map_err(|error| bad_row("verification kind", error))?;
        Ok(Verification {
            id: record_id(self.id, "verification id")?,
            kind,
            target: self.target,
            secret: self.secret,
            algorithm: self.algorithm,
            digits: u32::try_from(self.digits).map_err(|error| bad_row("digit count", error))?,
            period: u64::try_from(self.period).map_err(|error| bad_row("period", error))?,
            char_set: self.char_set,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}
