//! Account recovery and verification handlers.
//!
//! ```text
//! POST /auth/forgot-password  {"target":"<email or username>"}
//! POST /auth/verify           {"kind":"reset-password","target":"…","code":"…"}
//! POST /auth/verify           {"kind":"2fa","code":"…"}
//! POST /auth/reset-password   {"password":"…"}
//! ```
//!
//! Unknown reset targets and wrong codes collapse to the same "invalid code"
//! reply so the endpoint cannot be used to enumerate accounts.

use actix_web::{post, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{Error, Password, Username, VerificationKind};
use crate::inbound::http::ApiResult;
use crate::inbound::http::guards::{require_anonymous, require_recent_verification};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Forgot-password request body.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    /// Email address or username of the account to recover.
    pub target: String,
}

/// Verification submission body.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// `reset-password` or `2fa`.
    pub kind: String,
    /// Reset target; ignored for `2fa`, where the pending login session
    /// determines the subject.
    #[serde(default)]
    pub target: Option<String>,
    pub code: String,
}

/// Reset-password confirmation body.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub password: String,
}

/// Generic flow-outcome body.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlowResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

fn invalid_code() -> Error {
    Error::invalid_request("validation failed")
        .with_details(json!({ "fieldErrors": { "code": ["Invalid code"] } }))
}

/// Start a password reset.
///
/// Always replies with a generic acknowledgement; whether the target exists
/// is never revealed. The generated code leaves the system through an
/// out-of-band delivery channel, not this response.
#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses((status = 200, description = "Acknowledged", body = FlowResponse)),
    tags = ["auth"],
    operation_id = "forgotPassword",
    security([])
)]
#[post("/auth/forgot-password")]
pub async fn forgot_password(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ForgotPasswordRequest>,
) -> ApiResult<web::Json<FlowResponse>> {
    require_anonymous(&state, &session).await?;

    let target = payload.target.trim().to_lowercase();
    if let Some(user) = state
        .accounts
        .find_user_by_username_or_email(&target)
        .await?
    {
        let (_, _code) = state
            .verifications
            .begin_password_reset(&target, Utc::now())
            .await?;
        tracing::debug!(username = %user.username, "password reset code issued");
    }

    Ok(web::Json(FlowResponse {
        status: "ok".to_owned(),
        redirect_to: None,
    }))
}

async fn verify_reset_password(
    state: &web::Data<HttpState>,
    session: &SessionContext,
    target: &str,
    code: &str,
) -> Result<FlowResponse, Error> {
    let target = target.trim().to_lowercase();
    if !state
        .verifications
        .verify(VerificationKind::ResetPassword, &target, code, Utc::now())
        .await?
    {
        return Err(invalid_code());
    }
    // An unknown target gets the same reply as a wrong code.
    let Some(user) = state
        .accounts
        .find_user_by_username_or_email(&target)
        .await?
    else {
        return Err(invalid_code());
    };

    session.set_reset_username(&user.username)?;
    session.stamp_verified(Utc::now())?;
    Ok(FlowResponse {
        status: "ok".to_owned(),
        redirect_to: Some("/auth/reset-password".to_owned()),
    })
}

async fn verify_two_factor(
    state: &web::Data<HttpState>,
    session: &SessionContext,
    code: &str,
) -> Result<FlowResponse, Error> {
    let Some(pending_id) = session.unverified_session_id()? else {
        return Err(Error::invalid_request("no login awaiting two-factor"));
    };
    let Some(user_id) = state.authenticator.resolve_session(&pending_id).await? else {
        return Err(Error::invalid_request("no login awaiting two-factor"));
    };

    if !state
        .verifications
        .verify(VerificationKind::TwoFactor, user_id.as_ref(), code, Utc::now())
        .await?
    {
        return Err(invalid_code());
    }

    session.promote_unverified_session()?;
    session.stamp_verified(Utc::now())?;
    Ok(FlowResponse {
        status: "ok".to_owned(),
        redirect_to: Some("/".to_owned()),
    })
}

/// Validate a verification code and dispatch on its kind.
///
/// A successful validation stamps the session's recent-verification flag,
/// which gates sensitive actions for the next two hours.
#[utoipa::path(
    post,
    path = "/auth/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Code accepted", body = FlowResponse),
        (status = 400, description = "Invalid code", body = Error)
    ),
    tags = ["auth"],
    operation_id = "verify",
    security([])
)]
#[post("/auth/verify")]
pub async fn verify(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<VerifyRequest>,
) -> ApiResult<web::Json<FlowResponse>> {
    let response = match payload.kind.as_str() {
        "reset-password" => {
            let target = payload.target.as_deref().unwrap_or_default();
            verify_reset_password(&state, &session, target, &payload.code).await?
        }
        "2fa" => verify_two_factor(&state, &session, &payload.code).await?,
        other => {
            return Err(Error::invalid_request(format!(
                "unsupported verification kind: {other}"
            )));
        }
    };
    Ok(web::Json(response))
}

/// Confirm a verified password reset.
#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced", body = FlowResponse),
        (status = 303, description = "No verified reset in progress"),
        (status = 400, description = "Validation failure", body = Error)
    ),
    tags = ["auth"],
    operation_id = "resetPassword",
    security([])
)]
#[post("/auth/reset-password")]
pub async fn reset_password(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ResetPasswordRequest>,
) -> ApiResult<web::Json<FlowResponse>> {
    require_recent_verification(&session)?;
    let Some(username) = session.take_reset_username()? else {
        return Err(Error::redirect("/login"));
    };
    let username =
        Username::new(username).map_err(|err| Error::internal(format!("stashed username: {err}")))?;
    let password = Password::new(payload.password.clone()).map_err(|err| {
        Error::invalid_request("validation failed")
            .with_details(json!({ "fieldErrors": { "password": [err.to_string()] } }))
    })?;

    if !state
        .authenticator
        .reset_user_password(&username, &password)
        .await?
    {
        // The account vanished or never had a password; do not elaborate.
        return Err(invalid_code());
    }

    Ok(web::Json(FlowResponse {
        status: "ok".to_owned(),
        redirect_to: Some("/login".to_owned()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::VerificationRepository;
    use crate::inbound::http::auth::{LoginRequest, login, signup, SignupRequest};
    use crate::inbound::http::test_utils::{memory_state, test_session_middleware};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use serde_json::Value;

    fn test_app(
        state: crate::inbound::http::state::HttpState,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(state))
            .wrap(test_session_middleware())
            .service(signup)
            .service(login)
            .service(forgot_password)
            .service(verify)
            .service(reset_password)
    }

    async fn create_account(
        app: &impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
        username: &str,
        password: &str,
    ) {
        let res = actix_test::call_service(
            app,
            actix_test::TestRequest::post()
                .uri("/signup")
                .set_json(&SignupRequest {
                    email: format!("{username}@example.com"),
                    username: username.to_owned(),
                    password: password.to_owned(),
                    name: None,
                    redirect_to: None,
                })
                .to_request(),
        )
        .await;
        assert!(res.status().is_success());
    }

    #[actix_web::test]
    async fn forgot_password_reply_never_reveals_account_existence() {
        let (state, store) = memory_state();
        let app = actix_test::init_service(test_app(state)).await;
        create_account(&app, "alice", "wonderland9").await;

        for target in ["alice@example.com", "nobody@example.com"] {
            let res = actix_test::call_service(
                &app,
                actix_test::TestRequest::post()
                    .uri("/auth/forgot-password")
                    .set_json(&ForgotPasswordRequest {
                        target: target.to_owned(),
                    })
                    .to_request(),
            )
            .await;
            assert_eq!(res.status(), StatusCode::OK);
            let body: Value = actix_test::read_body_json(res).await;
            assert_eq!(body["status"], "ok");
        }

        // Only the real account got a verification row.
        assert!(
            store
                .find("alice@example.com", VerificationKind::ResetPassword)
                .await
                .expect("find verification")
                .is_some()
        );
        assert!(
            store
                .find("nobody@example.com", VerificationKind::ResetPassword)
                .await
                .expect("find verification")
                .is_none()
        );
    }

    #[actix_web::test]
    async fn full_reset_flow_replaces_the_password() {
        let (state, store) = memory_state();
        let app = actix_test::init_service(test_app(state)).await;
        create_account(&app, "alice", "wonderland9").await;

        actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/auth/forgot-password")
                .set_json(&ForgotPasswordRequest {
                    target: "alice@example.com".to_owned(),
                })
                .to_request(),
        )
        .await;

        let verification = store
            .find("alice@example.com", VerificationKind::ResetPassword)
            .await
            .expect("find verification")
            .expect("verification row");
        let code = verification
            .current_code(Utc::now())
            .expect("code generation");

        let verify_res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/auth/verify")
                .set_json(&VerifyRequest {
                    kind: "reset-password".to_owned(),
                    target: Some("alice@example.com".to_owned()),
                    code,
                })
                .to_request(),
        )
        .await;
        assert_eq!(verify_res.status(), StatusCode::OK);
        let cookie = verify_res
            .response()
            .cookies()
            .find(|c| c.name() == "session")
            .expect("session cookie")
            .into_owned();

        let reset_res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/auth/reset-password")
                .cookie(cookie)
                .set_json(&ResetPasswordRequest {
                    password: "looking-glass".to_owned(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(reset_res.status(), StatusCode::OK);

        let old_login = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/login")
                .set_json(&LoginRequest {
                    username: "alice".to_owned(),
                    password: "wonderland9".to_owned(),
                    redirect_to: None,
                })
                .to_request(),
        )
        .await;
        assert_eq!(old_login.status(), StatusCode::UNAUTHORIZED);

        let new_login = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/login")
                .set_json(&LoginRequest {
                    username: "alice".to_owned(),
                    password: "looking-glass".to_owned(),
                    redirect_to: None,
                })
                .to_request(),
        )
        .await;
        assert_eq!(new_login.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn wrong_code_and_unknown_target_get_the_same_reply() {
        let (state, _) = memory_state();
        let app = actix_test::init_service(test_app(state)).await;
        create_account(&app, "alice", "wonderland9").await;

        actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/auth/forgot-password")
                .set_json(&ForgotPasswordRequest {
                    target: "alice@example.com".to_owned(),
                })
                .to_request(),
        )
        .await;

        let mut bodies = Vec::new();
        for (target, code) in [
            ("alice@example.com", "000000"),
            ("nobody@example.com", "123456"),
        ] {
            let res = actix_test::call_service(
                &app,
                actix_test::TestRequest::post()
                    .uri("/auth/verify")
                    .set_json(&VerifyRequest {
                        kind: "reset-password".to_owned(),
                        target: Some(target.to_owned()),
                        code: code.to_owned(),
                    })
                    .to_request(),
            )
            .await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
            let body: Value = actix_test::read_body_json(res).await;
            bodies.push(body["details"]["fieldErrors"]["code"][0].clone());
        }
        assert_eq!(bodies[0], bodies[1]);
    }

    #[actix_web::test]
    async fn reset_without_recent_verification_is_diverted() {
        let (state, _) = memory_state();
        let app = actix_test::init_service(test_app(state)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/auth/reset-password")
                .set_json(&ResetPasswordRequest {
                    password: "looking-glass".to_owned(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            res.headers()
                .get(actix_web::http::header::LOCATION)
                .expect("location header"),
            "/auth/verify"
        );
    }
}
