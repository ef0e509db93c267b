//! Account and session handlers.
//!
//! ```text
//! POST /signup  {"email":"...","username":"...","password":"..."}
//! POST /login   {"username":"...","password":"..."}
//! POST /logout
//! GET  /me
//! ```
//!
//! Credential failures collapse to one generic message so the response never
//! distinguishes an unknown user from a wrong password.

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{
    Email, Error, LoginCredentials, NewAccount, Password, Username,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::guards::{
    login_redirect, require_anonymous, require_user_id, safe_redirect,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login request body.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// Optional same-site path to land on after login.
    #[serde(default)]
    pub redirect_to: Option<String>,
}

/// Signup request body.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub redirect_to: Option<String>,
}

/// Authentication outcome body.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// `ok` or `two-factor-required`.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

/// Logout query parameters.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct LogoutQuery {
    #[serde(default)]
    pub redirect_to: Option<String>,
}

fn field_errors(errors: Vec<(&str, String)>) -> Error {
    let mut map = serde_json::Map::new();
    for (field, message) in errors {
        if let Some(list) = map
            .entry(field.to_owned())
            .or_insert_with(|| json!([]))
            .as_array_mut()
        {
            list.push(json!(message));
        }
    }
    Error::invalid_request("validation failed").with_details(json!({ "fieldErrors": map }))
}

fn parse_login(payload: LoginRequest) -> Result<(LoginCredentials, Option<String>), Error> {
    let mut errors = Vec::new();
    let username = Username::new(&payload.username)
        .map_err(|err| errors.push(("username", err.to_string())))
        .ok();
    let password = Password::new(payload.password)
        .map_err(|err| errors.push(("password", err.to_string())))
        .ok();
    match (username, password) {
        (Some(username), Some(password)) => Ok((
            LoginCredentials { username, password },
            payload.redirect_to,
        )),
        _ => Err(field_errors(errors)),
    }
}

fn parse_signup(payload: SignupRequest) -> Result<(NewAccount, Option<String>), Error> {
    let mut errors = Vec::new();
    let email = Email::new(&payload.email)
        .map_err(|err| errors.push(("email", err.to_string())))
        .ok();
    let username = Username::new(&payload.username)
        .map_err(|err| errors.push(("username", err.to_string())))
        .ok();
    let password = Password::new(payload.password)
        .map_err(|err| errors.push(("password", err.to_string())))
        .ok();
    match (email, username, password) {
        (Some(email), Some(username), Some(password)) => Ok((
            NewAccount {
                email,
                username,
                name: payload.name.filter(|name| !name.trim().is_empty()),
                password,
            },
            payload.redirect_to,
        )),
        _ => Err(field_errors(errors)),
    }
}

/// Create an account, its password, and a session.
#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created, session established", body = AuthResponse),
        (status = 400, description = "Validation failure", body = Error),
        (status = 409, description = "Email or username already taken", body = Error)
    ),
    tags = ["auth"],
    operation_id = "signup",
    security([])
)]
#[post("/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignupRequest>,
) -> ApiResult<HttpResponse> {
    require_anonymous(&state, &session).await?;
    let (account, redirect_to) = parse_signup(payload.into_inner())?;
    let new_session = state.authenticator.signup(account).await?;
    session.persist_session(&new_session)?;
    Ok(HttpResponse::Ok().json(AuthResponse {
        status: "ok".to_owned(),
        redirect_to: Some(safe_redirect(redirect_to.as_deref())),
    }))
}

/// Verify credentials and establish a session.
///
/// Accounts with active two-factor login get their session stashed until the
/// code is verified via `POST /auth/verify`.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success or two-factor challenge", body = AuthResponse),
        (status = 400, description = "Validation failure", body = Error),
        (status = 401, description = "Invalid credentials", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    require_anonymous(&state, &session).await?;
    let (credentials, redirect_to) = parse_login(payload.into_inner())?;

    let Some(new_session) = state.authenticator.login(&credentials).await? else {
        return Err(Error::unauthorized("invalid credentials"));
    };

    if state
        .verifications
        .has_two_factor(&new_session.user_id)
        .await?
    {
        session.stash_unverified_session(&new_session)?;
        return Ok(HttpResponse::Ok().json(AuthResponse {
            status: "two-factor-required".to_owned(),
            redirect_to: None,
        }));
    }

    session.persist_session(&new_session)?;
    Ok(HttpResponse::Ok().json(AuthResponse {
        status: "ok".to_owned(),
        redirect_to: Some(safe_redirect(redirect_to.as_deref())),
    }))
}

/// Delete the caller's session best-effort, destroy the cookie, and divert.
///
/// This handler never returns normally; the outcome is always a redirect.
/// A failed session-row delete is swallowed upstream: an orphaned row does
/// no harm, while a lingering cookie would.
#[utoipa::path(
    post,
    path = "/logout",
    params(LogoutQuery),
    responses((status = 303, description = "Cookie destroyed, redirected")),
    tags = ["auth"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<LogoutQuery>,
) -> ApiResult<HttpResponse> {
    if let Some(session_id) = session.session_id()? {
        state.authenticator.end_session(&session_id).await;
    }
    session.clear();
    Err(Error::redirect(safe_redirect(query.redirect_to.as_deref())))
}

/// Divert the caller to their own profile.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 303, description = "Redirect to /users/{username}")
    ),
    tags = ["auth"],
    operation_id = "me"
)]
#[get("/me")]
pub async fn me(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    let user_id = require_user_id(&state, &session, &req).await?;
    match state.accounts.find_user_by_id(&user_id).await? {
        Some(user) => Err(Error::redirect(format!("/users/{}", user.username))),
        None => {
            // The session references a user that no longer exists; drop it
            // and send the caller through login.
            if let Some(session_id) = session.session_id()? {
                state.authenticator.end_session(&session_id).await;
            }
            session.clear();
            Err(login_redirect(Some(&req)))
        }
    }
}
