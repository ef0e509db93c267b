//! Note CRUD handlers, including multipart image uploads.
//!
//! ```text
//! GET    /users/{username}/notes
//! GET    /users/{username}/notes/{note_id}
//! POST   /users/{username}/notes            multipart: title, content, image…
//! PUT    /users/{username}/notes/{note_id}  multipart: title, content, keepImageId…, image…
//! DELETE /users/{username}/notes/{note_id}
//! ```
//!
//! Note creation and image insertion run as independent statements; a crash
//! between them leaves a note without images rather than rolling back.

use actix_multipart::form::MultipartForm;
use actix_multipart::form::bytes::Bytes;
use actix_multipart::form::text::Text;
use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{
    Error, ImageMetadata, NewImage, Note, NoteValidationError, PermissionSpec, RecordId, User,
    Username, validate_note_body,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::guards::require_user_id;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Maximum accepted size per uploaded image file.
pub const MAX_UPLOAD_SIZE_BYTES: usize = 3 * 1024 * 1024;

/// Multipart payload for note create/update.
///
/// `image` parts may repeat; `imageAltText` parts pair with them by position.
/// On update, existing images whose ids are absent from `keepImageId` are
/// removed.
#[derive(MultipartForm)]
pub struct NoteUploadForm {
    pub title: Text<String>,
    pub content: Text<String>,
    #[multipart(rename = "image", limit = "3MiB")]
    pub images: Vec<Bytes>,
    #[multipart(rename = "imageAltText")]
    pub image_alt_texts: Vec<Text<String>>,
    #[multipart(rename = "keepImageId")]
    pub keep_image_ids: Vec<Text<String>>,
}

/// Note representation returned by the read endpoints.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    #[serde(flatten)]
    pub note: Note,
    pub images: Vec<ImageMetadata>,
}

/// Listing entry for a user's notes.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteListItem {
    #[schema(value_type = String)]
    pub id: RecordId,
    pub title: String,
}

fn map_note_validation(err: NoteValidationError) -> Error {
    let field = match err {
        NoteValidationError::EmptyTitle | NoteValidationError::TitleTooLong { .. } => "title",
        NoteValidationError::EmptyContent | NoteValidationError::ContentTooLong { .. } => {
            "content"
        }
    };
    let mut field_errors = serde_json::Map::new();
    field_errors.insert(field.to_owned(), json!([err.to_string()]));
    Error::invalid_request("validation failed")
        .with_details(json!({ "fieldErrors": field_errors }))
}

async fn owner_by_username(state: &web::Data<HttpState>, username: &str) -> Result<User, Error> {
    let username = Username::new(username)
        .map_err(|_| Error::not_found(format!("no user with username {username}")))?;
    state
        .accounts
        .find_user_by_username(&username)
        .await?
        .ok_or_else(|| Error::not_found(format!("no user with username {username}")))
}

fn new_images_from(form: &NoteUploadForm) -> Result<Vec<NewImage>, Error> {
    form.images
        .iter()
        .enumerate()
        .filter(|(_, upload)| !upload.data.is_empty())
        .map(|(index, upload)| {
            if upload.data.len() > MAX_UPLOAD_SIZE_BYTES {
                return Err(Error::invalid_request("image exceeds the 3 MiB upload limit"));
            }
            let alt_text = form
                .image_alt_texts
                .get(index)
                .map(|text| text.0.clone())
                .filter(|text| !text.is_empty());
            let content_type = upload
                .content_type
                .as_ref()
                .map_or_else(|| "application/octet-stream".to_owned(), |m| m.to_string());
            Ok(NewImage::from_upload(
                alt_text,
                content_type,
                upload.data.to_vec(),
            ))
        })
        .collect()
}

/// List a user's notes, most recently updated first.
#[utoipa::path(
    get,
    path = "/users/{username}/notes",
    responses(
        (status = 200, description = "Notes owned by the user", body = [NoteListItem]),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["notes"],
    operation_id = "listNotes",
    security([])
)]
#[get("/users/{username}/notes")]
pub async fn list_notes(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<NoteListItem>>> {
    let owner = owner_by_username(&state, &path.into_inner()).await?;
    let notes = state.notes.list_for_owner(&owner.id).await?;
    Ok(web::Json(
        notes
            .into_iter()
            .map(|note| NoteListItem {
                id: note.id,
                title: note.title,
            })
            .collect(),
    ))
}

/// Fetch one note with its image metadata.
#[utoipa::path(
    get,
    path = "/users/{username}/notes/{note_id}",
    responses(
        (status = 200, description = "The note", body = NoteResponse),
        (status = 404, description = "Unknown user or note", body = Error)
    ),
    tags = ["notes"],
    operation_id = "getNote",
    security([])
)]
#[get("/users/{username}/notes/{note_id}")]
pub async fn get_note(
    state: web::Data<HttpState>,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<NoteResponse>> {
    let (username, note_id) = path.into_inner();
    let owner = owner_by_username(&state, &username).await?;
    let note_id =
        RecordId::new(note_id).map_err(|_| Error::not_found("no note with that id"))?;
    let note = state
        .notes
        .find(&note_id)
        .await?
        .filter(|note| note.owner_id == owner.id)
        .ok_or_else(|| Error::not_found(format!("no note with id {note_id}")))?;
    let images = state.notes.list_images(&note.id).await?;
    Ok(web::Json(NoteResponse { note, images }))
}

/// Create a note, then attach any uploaded images.
#[utoipa::path(
    post,
    path = "/users/{username}/notes",
    responses(
        (status = 200, description = "Created note", body = NoteResponse),
        (status = 400, description = "Validation failure", body = Error),
        (status = 403, description = "Caller is not the path owner", body = Error)
    ),
    tags = ["notes"],
    operation_id = "createNote"
)]
#[post("/users/{username}/notes")]
pub async fn create_note(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
    path: web::Path<String>,
    MultipartForm(form): MultipartForm<NoteUploadForm>,
) -> ApiResult<web::Json<NoteResponse>> {
    let caller = require_user_id(&state, &session, &req).await?;
    let owner = owner_by_username(&state, &path.into_inner()).await?;
    if owner.id != caller {
        return Err(Error::forbidden("notes can only be created on your own profile"));
    }

    validate_note_body(&form.title, &form.content).map_err(map_note_validation)?;
    let images = new_images_from(&form)?;

    let note = Note::create(caller, form.title.0.clone(), form.content.0.clone());
    state.notes.create(&note).await?;
    // Independent statements per image; no surrounding transaction.
    for image in &images {
        state.notes.attach_image(&note.id, image).await?;
    }

    let images = state.notes.list_images(&note.id).await?;
    Ok(web::Json(NoteResponse { note, images }))
}

/// Update a note's body and reconcile its images.
#[utoipa::path(
    put,
    path = "/users/{username}/notes/{note_id}",
    responses(
        (status = 200, description = "Updated note", body = NoteResponse),
        (status = 400, description = "Validation failure", body = Error),
        (status = 404, description = "Not the caller's note", body = Error)
    ),
    tags = ["notes"],
    operation_id = "updateNote"
)]
#[put("/users/{username}/notes/{note_id}")]
pub async fn update_note(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    MultipartForm(form): MultipartForm<NoteUploadForm>,
) -> ApiResult<web::Json<NoteResponse>> {
    let caller = require_user_id(&state, &session, &req).await?;
    let (_, note_id) = path.into_inner();
    let note_id =
        RecordId::new(note_id).map_err(|_| Error::not_found("no note with that id"))?;

    validate_note_body(&form.title, &form.content).map_err(map_note_validation)?;
    let new_images = new_images_from(&form)?;
    let keep: Vec<RecordId> = form
        .keep_image_ids
        .iter()
        .filter_map(|text| RecordId::new(text.0.clone()).ok())
        .collect();

    let updated = state
        .notes
        .update(&note_id, &caller, &form.title, &form.content, Utc::now())
        .await?;
    if !updated {
        return Err(Error::not_found(format!("no note with id {note_id}")));
    }

    state.notes.remove_images_except(&note_id, &keep).await?;
    for image in &new_images {
        state.notes.attach_image(&note_id, image).await?;
    }

    let note = state
        .notes
        .find(&note_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("no note with id {note_id}")))?;
    let images = state.notes.list_images(&note_id).await?;
    Ok(web::Json(NoteResponse { note, images }))
}

/// Delete a note. The owner may always delete their own note; anyone else
/// needs the `delete:note:any` permission.
#[utoipa::path(
    delete,
    path = "/users/{username}/notes/{note_id}",
    responses(
        (status = 200, description = "Note deleted"),
        (status = 403, description = "Missing delete:note:any", body = Error),
        (status = 404, description = "Unknown note", body = Error)
    ),
    tags = ["notes"],
    operation_id = "deleteNote"
)]
#[delete("/users/{username}/notes/{note_id}")]
pub async fn delete_note(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let caller = require_user_id(&state, &session, &req).await?;
    let (_, note_id) = path.into_inner();
    let note_id =
        RecordId::new(note_id).map_err(|_| Error::not_found("no note with that id"))?;
    let note = state
        .notes
        .find(&note_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("no note with id {note_id}")))?;

    if note.owner_id != caller {
        let spec = PermissionSpec::of("delete", "note").with_access(["any"]);
        state.access.require_permission(&caller, &spec).await?;
    }

    state.notes.delete(&note_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "deleted" })))
}
