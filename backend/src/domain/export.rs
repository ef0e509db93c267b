//! Full user-data export bundle.
//!
//! Binary blobs are excluded; the inbound adapter derives fetch URLs for each
//! image id instead.

use serde::{Deserialize, Serialize};

use super::access::Role;
use super::note::{ImageMetadata, Note};
use super::session::Session;
use super::user::User;

/// A note together with its image attachments' metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteExport {
    #[serde(flatten)]
    pub note: Note,
    pub images: Vec<ImageMetadata>,
}

/// Everything a user can download about their account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserExport {
    pub user: User,
    pub image: Option<ImageMetadata>,
    pub notes: Vec<NoteExport>,
    pub sessions: Vec<Session>,
    /// Populated separately from the role store.
    #[serde(default)]
    pub roles: Vec<Role>,
}
