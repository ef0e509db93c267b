//! Server construction and middleware wiring.

mod config;

pub use config::AppConfig;

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use backend::Trace;
#[cfg(debug_assertions)]
use backend::ApiDoc;
use backend::domain::ProviderRegistry;
use backend::inbound::http::auth::{login, logout, me, signup};
use backend::inbound::http::export::download_user_data;
use backend::inbound::http::images::{note_image, user_image};
use backend::inbound::http::notes::{create_note, delete_note, get_note, list_notes, update_note};
use backend::inbound::http::providers::{provider_begin, provider_callback};
use backend::inbound::http::recovery::{forgot_password, reset_password, verify};
use backend::inbound::http::state::{HttpState, HttpStatePorts};
use backend::inbound::http::two_factor::{
    two_factor_disable, two_factor_setup, two_factor_status, two_factor_verify,
};
use backend::inbound::http::users::{delete_user, search_users};
use backend::outbound::persistence::{
    DbPool, DieselAccessRepository, DieselAccountRepository, DieselNoteRepository,
    DieselSessionRepository, DieselVerificationRepository, PoolConfig,
};
#[cfg(debug_assertions)]
use utoipa::OpenApi;

#[derive(Clone)]
struct AppDependencies {
    http_state: web::Data<HttpState>,
    key: Key,
    cookie_secure: bool,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        http_state,
        key,
        cookie_secure,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .build();

    let app = App::new()
        .app_data(http_state)
        .wrap(session)
        .wrap(Trace)
        .service(signup)
        .service(login)
        .service(logout)
        .service(me)
        .service(search_users)
        .service(delete_user)
        .service(list_notes)
        .service(get_note)
        .service(create_note)
        .service(update_note)
        .service(delete_note)
        .service(note_image)
        .service(user_image)
        .service(download_user_data)
        .service(forgot_password)
        .service(verify)
        .service(reset_password)
        .service(two_factor_status)
        .service(two_factor_setup)
        .service(two_factor_verify)
        .service(two_factor_disable)
        .service(provider_begin)
        .service(provider_callback);

    #[cfg(debug_assertions)]
    let app = app.route(
        "/api-docs/openapi.json",
        web::get().to(|| async {
            actix_web::HttpResponse::Ok().json(ApiDoc::openapi())
        }),
    );

    app
}

/// Build the repository-backed HTTP state over a connection pool.
fn build_http_state(pool: &DbPool, providers: ProviderRegistry) -> HttpState {
    HttpState::new(HttpStatePorts {
        accounts: Arc::new(DieselAccountRepository::new(pool.clone())),
        sessions: Arc::new(DieselSessionRepository::new(pool.clone())),
        access: Arc::new(DieselAccessRepository::new(pool.clone())),
        verifications: Arc::new(DieselVerificationRepository::new(pool.clone())),
        notes: Arc::new(DieselNoteRepository::new(pool.clone())),
        providers,
    })
}

/// Construct the Actix HTTP server.
///
/// Builds the connection pool from `config.database_url`, wires the Diesel
/// adapters into the HTTP state, and binds the listener.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when the pool cannot be built or the socket
/// cannot be bound.
pub async fn create_server(
    config: AppConfig,
    providers: ProviderRegistry,
) -> std::io::Result<Server> {
    let pool = DbPool::new(PoolConfig::new(&config.database_url))
        .await
        .map_err(|err| std::io::Error::other(format!("database pool: {err}")))?;
    let http_state = web::Data::new(build_http_state(&pool, providers));

    let AppConfig {
        session_key,
        cookie_secure,
        bind_addr,
        ..
    } = config;

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            http_state: http_state.clone(),
            key: session_key.clone(),
            cookie_secure,
        })
    })
    .bind(bind_addr)?
    .run();

    Ok(server)
}
