//! Binary image fetch handlers.
//!
//! ```text
//! GET /resources/note-images/{image_id}
//! GET /resources/user-images/{image_id}
//! ```
//!
//! Responses carry the stored content type, an inline content disposition,
//! and a one-year immutable cache directive; image ids are random, so a new
//! upload always gets a new URL.

use actix_web::http::header;
use actix_web::{HttpResponse, get, web};

use crate::domain::{Error, ImageData, RecordId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::cache_control::immutable_resource_header;
use crate::inbound::http::state::HttpState;

fn image_response(image: ImageData) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, image.content_type))
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", image.id),
        ))
        .insert_header(immutable_resource_header())
        .body(image.blob)
}

fn parse_image_id(raw: String) -> Result<RecordId, Error> {
    RecordId::new(raw).map_err(|_| Error::invalid_request("image id is required"))
}

/// Fetch a note image payload.
#[utoipa::path(
    get,
    path = "/resources/note-images/{image_id}",
    responses(
        (status = 200, description = "Raw image bytes"),
        (status = 404, description = "Unknown image", body = Error)
    ),
    tags = ["resources"],
    operation_id = "getNoteImage",
    security([])
)]
#[get("/resources/note-images/{image_id}")]
pub async fn note_image(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let image_id = parse_image_id(path.into_inner())?;
    let image = state
        .notes
        .find_image(&image_id)
        .await?
        .ok_or_else(|| Error::not_found("Not found"))?;
    Ok(image_response(image))
}

/// Fetch a profile image payload.
#[utoipa::path(
    get,
    path = "/resources/user-images/{image_id}",
    responses(
        (status = 200, description = "Raw image bytes"),
        (status = 404, description = "Unknown image", body = Error)
    ),
    tags = ["resources"],
    operation_id = "getUserImage",
    security([])
)]
#[get("/resources/user-images/{image_id}")]
pub async fn user_image(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let image_id = parse_image_id(path.into_inner())?;
    let image = state
        .accounts
        .find_user_image(&image_id)
        .await?
        .ok_or_else(|| Error::not_found("Not found"))?;
    Ok(image_response(image))
}
