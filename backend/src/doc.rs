//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] aggregates every HTTP endpoint and the schemas they reference.
//! The generated document is served as JSON in debug builds and exported via
//! `cargo run --bin openapi-dump` for external tooling.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode, User, UserListing};
use crate::inbound::http::auth::{AuthResponse, LoginRequest, SignupRequest};
use crate::inbound::http::notes::{NoteListItem, NoteResponse};
use crate::inbound::http::recovery::{
    FlowResponse, ForgotPasswordRequest, ResetPasswordRequest, VerifyRequest,
};
use crate::inbound::http::two_factor::{
    TwoFactorSetupResponse, TwoFactorStatus, TwoFactorVerifyRequest,
};
use crate::inbound::http::users::UserSearchResponse;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /login or POST /signup.",
            ))),
        );
    }
}

/// OpenAPI document for the HTTP surface.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Notes backend API",
        description = "Accounts, sessions, role-based authorization, and notes with image attachments."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::signup,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::me,
        crate::inbound::http::users::search_users,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::notes::list_notes,
        crate::inbound::http::notes::get_note,
        crate::inbound::http::notes::create_note,
        crate::inbound::http::notes::update_note,
        crate::inbound::http::notes::delete_note,
        crate::inbound::http::images::note_image,
        crate::inbound::http::images::user_image,
        crate::inbound::http::export::download_user_data,
        crate::inbound::http::recovery::forgot_password,
        crate::inbound::http::recovery::verify,
        crate::inbound::http::recovery::reset_password,
        crate::inbound::http::two_factor::two_factor_status,
        crate::inbound::http::two_factor::two_factor_setup,
        crate::inbound::http::two_factor::two_factor_verify,
        crate::inbound::http::two_factor::two_factor_disable,
        crate::inbound::http::providers::provider_begin,
        crate::inbound::http::providers::provider_callback,
    ),
    components(schemas(
        Error,
        ErrorCode,
        User,
        UserListing,
        LoginRequest,
        SignupRequest,
        AuthResponse,
        UserSearchResponse,
        NoteResponse,
        NoteListItem,
        ForgotPasswordRequest,
        VerifyRequest,
        ResetPasswordRequest,
        FlowResponse,
        TwoFactorStatus,
        TwoFactorSetupResponse,
        TwoFactorVerifyRequest,
    )),
    tags(
        (name = "auth", description = "Signup, login, logout, and account recovery"),
        (name = "users", description = "User search"),
        (name = "notes", description = "Note CRUD and image attachments"),
        (name = "resources", description = "Binary resources and data export"),
        (name = "settings", description = "Account settings")
    )
)]
pub struct ApiDoc;
