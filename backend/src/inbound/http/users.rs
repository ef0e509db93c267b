//! User search handler.
//!
//! ```text
//! GET /users?search=<term>
//! ```

use actix_web::{HttpRequest, HttpResponse, delete, get, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{Error, UserListing, Username};
use crate::inbound::http::ApiResult;
use crate::inbound::http::guards::require_user_id;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Search query parameters.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct UserSearchQuery {
    /// Case-insensitive substring matched against username or name.
    pub search: Option<String>,
}

/// Search response body.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchResponse {
    pub status: String,
    pub users: Vec<UserListing>,
}

/// List users matching the search term.
///
/// An explicit empty search term diverts to the unfiltered listing; a missing
/// term lists the first 50 users. Results are ordered by each user's most
/// recent note activity, descending.
#[utoipa::path(
    get,
    path = "/users",
    params(UserSearchQuery),
    responses(
        (status = 200, description = "Matching users", body = UserSearchResponse),
        (status = 303, description = "Empty search term redirected to the unfiltered list")
    ),
    tags = ["users"],
    operation_id = "searchUsers",
    security([])
)]
#[get("/users")]
pub async fn search_users(
    state: web::Data<HttpState>,
    query: web::Query<UserSearchQuery>,
) -> ApiResult<web::Json<UserSearchResponse>> {
    if query.search.as_deref() == Some("") {
        return Err(Error::redirect("/users"));
    }

    let term = query.search.as_deref().unwrap_or("");
    let users = state.accounts.search_users(term).await?;
    Ok(web::Json(UserSearchResponse {
        status: "idle".to_owned(),
        users,
    }))
}

/// Delete a user account and, through the store's cascades, everything it
/// owns. Users may delete themselves; deleting anyone else takes the `admin`
/// role.
#[utoipa::path(
    delete,
    path = "/users/{username}",
    responses(
        (status = 200, description = "Account deleted"),
        (status = 403, description = "Missing admin role", body = Error),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{username}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let caller = require_user_id(&state, &session, &req).await?;
    let username = path.into_inner();
    let username = Username::new(&username)
        .map_err(|_| Error::not_found(format!("no user with username {username}")))?;
    let target = state
        .accounts
        .find_user_by_username(&username)
        .await?
        .ok_or_else(|| Error::not_found(format!("no user with username {username}")))?;

    if target.id != caller {
        state.access.require_role(&caller, "admin").await?;
    }

    state.accounts.delete_user(&target.id).await?;
    if target.id == caller {
        // Their session rows cascaded away; drop the cookie too.
        session.clear();
    }
    Ok(HttpResponse::Ok().json(json!({ "status": "deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{AccountRepository, NoteRepository};
    use crate::domain::{Email, Note, User};
    use crate::inbound::http::test_utils::{memory_state, test_session_middleware};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use serde_json::Value;

    fn test_app(
        state: HttpState,
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
            .service(search_users)
            .service(delete_user)
            .service(crate::inbound::http::auth::signup)
    }

    fn user(username: &str, name: &str) -> User {
        User::create(
            Email::new(format!("{username}@example.com")).expect("valid email"),
            Username::new(username).expect("valid username"),
            Some(name.to_owned()),
        )
    }

    #[actix_web::test]
    async fn empty_search_term_diverts_to_the_unfiltered_list() {
        let (state, _) = memory_state();
        let app = actix_test::init_service(test_app(state)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/users?search=")
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            res.headers()
                .get(actix_web::http::header::LOCATION)
                .expect("location header"),
            "/users"
        );
    }

    #[actix_web::test]
    async fn matches_username_and_name_case_insensitively() {
        let (state, store) = memory_state();
        for (username, name) in [("kody", "Kody"), ("alice", "Alice Koala"), ("bob", "Bob")] {
            store
                .create_user(&user(username, name))
                .await
                .expect("insert user");
        }
        let app = actix_test::init_service(test_app(state)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/users?search=KO")
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        let usernames: Vec<&str> = body["users"]
            .as_array()
            .expect("users array")
            .iter()
            .filter_map(|u| u["username"].as_str())
            .collect();
        assert!(usernames.contains(&"kody"));
        assert!(usernames.contains(&"alice"));
        assert!(!usernames.contains(&"bob"));
    }

    async fn signup_cookie(
        app: &impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
        username: &str,
    ) -> actix_web::cookie::Cookie<'static> {
        let res = actix_test::call_service(
            app,
            actix_test::TestRequest::post()
                .uri("/signup")
                .set_json(&crate::inbound::http::auth::SignupRequest {
                    email: format!("{username}@example.com"),
                    username: username.to_owned(),
                    password: "wonderland9".to_owned(),
                    name: None,
                    redirect_to: None,
                })
                .to_request(),
        )
        .await;
        assert!(res.status().is_success());
        res.response()
            .cookies()
            .find(|c| c.name() == "session")
            .expect("session cookie")
            .into_owned()
    }

    #[actix_web::test]
    async fn self_deletion_cascades_and_clears_the_cookie() {
        let (state, store) = memory_state();
        let app = actix_test::init_service(test_app(state)).await;
        let cookie = signup_cookie(&app, "alice").await;

        let alice = store.user_by_username("alice").expect("user exists");
        NoteRepository::create(
            store.as_ref(),
            &Note::create(alice.id.clone(), "t", "c"),
        )
        .await
        .expect("insert note");

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri("/users/alice")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(store.user_by_username("alice").is_none());
        assert!(!store.has_rows_referencing(&alice.id));
    }

    #[actix_web::test]
    async fn deleting_someone_else_requires_the_admin_role() {
        let (state, store) = memory_state();
        let app = actix_test::init_service(test_app(state)).await;
        signup_cookie(&app, "alice").await;
        let bob_cookie = signup_cookie(&app, "bob").await;

        let denied = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri("/users/alice")
                .cookie(bob_cookie.clone())
                .to_request(),
        )
        .await;
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);
        let body: Value = actix_test::read_body_json(denied).await;
        assert_eq!(body["details"]["requiredRole"], "admin");

        let bob = store.user_by_username("bob").expect("user exists");
        let role = store.add_role("admin");
        store.assign_role_directly(&bob.id, &role);

        let allowed = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri("/users/alice")
                .cookie(bob_cookie)
                .to_request(),
        )
        .await;
        assert_eq!(allowed.status(), StatusCode::OK);
        assert!(store.user_by_username("alice").is_none());
    }

    #[actix_web::test]
    async fn orders_by_most_recent_note_activity() {
        let (state, store) = memory_state();
        let quiet = user("quiet", "Quiet");
        let busy = user("busy", "Busy");
        store.create_user(&quiet).await.expect("insert user");
        store.create_user(&busy).await.expect("insert user");

        let mut old_note = Note::create(quiet.id.clone(), "old", "content");
        old_note.updated_at -= chrono::Duration::days(7);
        NoteRepository::create(store.as_ref(), &old_note)
            .await
            .expect("insert note");
        let fresh_note = Note::create(busy.id.clone(), "fresh", "content");
        NoteRepository::create(store.as_ref(), &fresh_note)
            .await
            .expect("insert note");

        let app = actix_test::init_service(test_app(state)).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/users").to_request(),
        )
        .await;
        let body: Value = actix_test::read_body_json(res).await;
        let usernames: Vec<&str> = body["users"]
            .as_array()
            .expect("users array")
            .iter()
            .filter_map(|u| u["username"].as_str())
            .collect();
        assert_eq!(usernames, vec!["busy", "quiet"]);
    }
}
