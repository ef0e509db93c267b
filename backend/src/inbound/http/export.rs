//! Full user-data export handler.
//!
//! ```text
//! GET /resources/download-user-data
//! ```
//!
//! The bundle contains the caller's profile, notes, sessions, and roles.
//! Binary blobs are excluded; each image carries a derived URL instead.

use actix_web::{HttpRequest, HttpResponse, get, web};
use serde::Serialize;
use serde_json::json;

use crate::domain::{Error, ImageMetadata};
use crate::inbound::http::ApiResult;
use crate::inbound::http::guards::require_user_id;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageWithUrl {
    #[serde(flatten)]
    metadata: ImageMetadata,
    url: String,
}

fn with_url(metadata: ImageMetadata, domain: &str, segment: &str) -> ImageWithUrl {
    let url = format!("{domain}/resources/{segment}/{}", metadata.id);
    ImageWithUrl { metadata, url }
}

fn domain_url(req: &HttpRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
}

/// Download everything stored about the calling user.
#[utoipa::path(
    get,
    path = "/resources/download-user-data",
    responses(
        (status = 200, description = "Export bundle"),
        (status = 404, description = "User not found", body = Error)
    ),
    tags = ["resources"],
    operation_id = "downloadUserData"
)]
#[get("/resources/download-user-data")]
pub async fn download_user_data(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    let user_id = require_user_id(&state, &session, &req).await?;
    let mut export = state
        .accounts
        .export_user_data(&user_id)
        .await?
        .ok_or_else(|| Error::not_found("User not found"))?;
    export.roles = state.access.roles_for_user(&user_id).await?;

    let domain = domain_url(&req);
    let image = export
        .image
        .map(|metadata| with_url(metadata, &domain, "user-images"));
    let notes: Vec<_> = export
        .notes
        .into_iter()
        .map(|note_export| {
            let images: Vec<_> = note_export
                .images
                .into_iter()
                .map(|metadata| with_url(metadata, &domain, "note-images"))
                .collect();
            json!({
                "id": note_export.note.id,
                "title": note_export.note.title,
                "content": note_export.note.content,
                "createdAt": note_export.note.created_at,
                "updatedAt": note_export.note.updated_at,
                "images": images,
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "user": {
            "id": export.user.id,
            "email": export.user.email,
            "username": export.user.username,
            "name": export.user.name,
            "createdAt": export.user.created_at,
            "updatedAt": export.user.updated_at,
            "image": image,
            "notes": notes,
            "sessions": export.sessions,
            "roles": export.roles,
        }
    })))
}
