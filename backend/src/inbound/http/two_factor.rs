//! Two-factor authentication settings handlers.
//!
//! ```text
//! GET  /settings/two-factor          status
//! POST /settings/two-factor          begin enrolment
//! POST /settings/two-factor/verify   confirm enrolment
//! POST /settings/two-factor/disable  requires a recent verification
//! ```

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::guards::{require_recent_verification, require_user_id};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Enrolment state body.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorStatus {
    pub enabled: bool,
}

/// Enrolment parameters handed to the authenticator app.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorSetupResponse {
    /// Base32-encoded shared secret.
    pub secret: String,
    pub algorithm: String,
    pub digits: u32,
    pub period: u64,
}

/// Enrolment confirmation body.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorVerifyRequest {
    pub code: String,
}

/// Report whether two-factor login is active for the caller.
#[utoipa::path(
    get,
    path = "/settings/two-factor",
    responses((status = 200, description = "Enrolment state", body = TwoFactorStatus)),
    tags = ["settings"],
    operation_id = "twoFactorStatus"
)]
#[get("/settings/two-factor")]
pub async fn two_factor_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
) -> ApiResult<web::Json<TwoFactorStatus>> {
    let user_id = require_user_id(&state, &session, &req).await?;
    let enabled = state.verifications.has_two_factor(&user_id).await?;
    Ok(web::Json(TwoFactorStatus { enabled }))
}

/// Begin two-factor enrolment, replacing any pending setup.
#[utoipa::path(
    post,
    path = "/settings/two-factor",
    responses((status = 200, description = "Setup parameters", body = TwoFactorSetupResponse)),
    tags = ["settings"],
    operation_id = "twoFactorSetup"
)]
#[post("/settings/two-factor")]
pub async fn two_factor_setup(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
) -> ApiResult<web::Json<TwoFactorSetupResponse>> {
    let user_id = require_user_id(&state, &session, &req).await?;
    let verification = state.verifications.begin_two_factor_setup(&user_id).await?;
    Ok(web::Json(TwoFactorSetupResponse {
        secret: verification.secret,
        algorithm: verification.algorithm,
        digits: verification.digits,
        period: verification.period,
    }))
}

/// Confirm enrolment by proving possession of the secret.
///
/// Confirmation counts as a completed verification challenge, so it also
/// stamps the recent-verification flag.
#[utoipa::path(
    post,
    path = "/settings/two-factor/verify",
    request_body = TwoFactorVerifyRequest,
    responses(
        (status = 200, description = "Two-factor enabled"),
        (status = 400, description = "Invalid code", body = Error)
    ),
    tags = ["settings"],
    operation_id = "twoFactorVerify"
)]
#[post("/settings/two-factor/verify")]
pub async fn two_factor_verify(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
    payload: web::Json<TwoFactorVerifyRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = require_user_id(&state, &session, &req).await?;
    let confirmed = state
        .verifications
        .confirm_two_factor(&user_id, &payload.code, Utc::now())
        .await?;
    if !confirmed {
        return Err(Error::invalid_request("validation failed")
            .with_details(json!({ "fieldErrors": { "code": ["Invalid code"] } })));
    }
    session.stamp_verified(Utc::now())?;
    Ok(HttpResponse::Ok().json(json!({ "status": "enabled" })))
}

/// Disable two-factor login; gated on a recent verification challenge.
#[utoipa::path(
    post,
    path = "/settings/two-factor/disable",
    responses(
        (status = 200, description = "Two-factor disabled"),
        (status = 303, description = "No recent verification; diverted to verify")
    ),
    tags = ["settings"],
    operation_id = "twoFactorDisable"
)]
#[post("/settings/two-factor/disable")]
pub async fn two_factor_disable(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    require_recent_verification(&session)?;
    let user_id = require_user_id(&state, &session, &req).await?;
    state.verifications.disable_two_factor(&user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "disabled" })))
}
