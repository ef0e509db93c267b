//! External-provider login handlers.
//!
//! ```text
//! GET /auth/{provider}            divert to the provider's authorize URL
//! GET /auth/{provider}/callback   exchange the code, log in or sign up
//! ```
//!
//! The handlers only talk to the [`crate::domain::AuthProvider`] interface;
//! which concrete providers exist is decided at wiring time.

use actix_web::{HttpResponse, get, web};
use serde::Deserialize;

use crate::domain::{Email, Error, NewConnectedAccount, RecordId, Username};
use crate::inbound::http::ApiResult;
use crate::inbound::http::guards::require_anonymous;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Callback query parameters.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct CallbackQuery {
    pub code: String,
}

/// Derive a valid username from what the provider reported.
///
/// Falls back to the email local part, strips disallowed characters, and
/// pads with the provider id when too little survives.
fn derive_username(
    reported: Option<&str>,
    email: &str,
    provider_id: &str,
) -> Result<Username, Error> {
    let base = reported
        .map(str::to_owned)
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_owned());
    let mut cleaned: String = base
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect();
    if cleaned.chars().count() < 3 {
        let suffix: String = provider_id
            .to_lowercase()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect();
        cleaned = format!("{cleaned}_{suffix}");
    }
    cleaned.truncate(20);
    Username::new(cleaned)
        .map_err(|err| Error::internal(format!("derived username invalid: {err}")))
}

/// Start an external-provider authentication round trip.
#[utoipa::path(
    get,
    path = "/auth/{provider}",
    responses(
        (status = 303, description = "Diverted to the provider"),
        (status = 404, description = "Unknown provider", body = Error)
    ),
    tags = ["auth"],
    operation_id = "providerBegin",
    security([])
)]
#[get("/auth/{provider}")]
pub async fn provider_begin(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    require_anonymous(&state, &session).await?;
    let provider = state.authenticator.provider(&path.into_inner())?;
    let anti_forgery = RecordId::random();
    let url = provider.begin(anti_forgery.as_ref()).await?;
    Err(Error::redirect(url))
}

/// Handle the provider callback: log the external identity in, creating a
/// local account on first contact.
#[utoipa::path(
    get,
    path = "/auth/{provider}/callback",
    params(CallbackQuery),
    responses(
        (status = 303, description = "Logged in, diverted to the site root"),
        (status = 404, description = "Unknown provider", body = Error),
        (status = 409, description = "Email already taken by a password account", body = Error)
    ),
    tags = ["auth"],
    operation_id = "providerCallback",
    security([])
)]
#[get("/auth/{provider}/callback")]
pub async fn provider_callback(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    query: web::Query<CallbackQuery>,
) -> ApiResult<HttpResponse> {
    require_anonymous(&state, &session).await?;
    let provider = state.authenticator.provider(&path.into_inner())?;
    let identity = provider.handle_callback(&query.code).await?;

    // Known connection: straight to a session.
    if let Some(existing) = state.authenticator.login_with_connection(&identity).await? {
        session.persist_session(&existing)?;
        return Err(Error::redirect("/"));
    }

    let email = Email::new(&identity.email)
        .map_err(|err| Error::internal(format!("provider email invalid: {err}")))?;
    let username = derive_username(
        identity.username.as_deref(),
        email.as_ref(),
        &identity.provider_id,
    )?;

    let new_session = state
        .authenticator
        .signup_with_connection(NewConnectedAccount {
            email,
            username,
            name: identity.name.clone(),
            provider_name: identity.provider_name.clone(),
            provider_id: identity.provider_id.clone(),
        })
        .await?;
    session.persist_session(&new_session)?;
    Err(Error::redirect("/"))
}
