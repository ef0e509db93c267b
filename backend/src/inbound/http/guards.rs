//! Request guards resolving the caller's identity from the session cookie.
//!
//! Guards fail by short-circuiting into a redirect error, so handlers use
//! them with `?` and never see an unauthenticated caller.

use actix_web::HttpRequest;
use actix_web::web;
use chrono::Utc;

use crate::domain::{Error, RecordId};

use super::session::SessionContext;
use super::state::HttpState;

/// Login entry point guards divert to.
pub const LOGIN_PATH: &str = "/login";
/// Verification entry point the recent-verification gate diverts to.
pub const VERIFY_PATH: &str = "/auth/verify";

/// Resolve the caller's user id, if any.
///
/// A cookie referencing a missing or expired session is treated as stale or
/// forged: the cookie is destroyed client-side and control diverts to the
/// site root.
pub async fn get_user_id(
    state: &web::Data<HttpState>,
    session: &SessionContext,
) -> Result<Option<RecordId>, Error> {
    let Some(session_id) = session.session_id()? else {
        return Ok(None);
    };
    match state.authenticator.resolve_session(&session_id).await? {
        Some(user_id) => Ok(Some(user_id)),
        None => {
            session.clear();
            Err(Error::redirect("/"))
        }
    }
}

/// Require an authenticated caller; divert to the login entry point with a
/// return-path hint otherwise.
pub async fn require_user_id(
    state: &web::Data<HttpState>,
    session: &SessionContext,
    req: &HttpRequest,
) -> Result<RecordId, Error> {
    match get_user_id(state, session).await? {
        Some(user_id) => Ok(user_id),
        None => Err(login_redirect(Some(req))),
    }
}

/// Variant of [`require_user_id`] that suppresses the return-path hint.
pub async fn require_user_id_without_return(
    state: &web::Data<HttpState>,
    session: &SessionContext,
) -> Result<RecordId, Error> {
    match get_user_id(state, session).await? {
        Some(user_id) => Ok(user_id),
        None => Err(login_redirect(None)),
    }
}

/// Inverse guard: divert authenticated callers to the site root.
pub async fn require_anonymous(
    state: &web::Data<HttpState>,
    session: &SessionContext,
) -> Result<(), Error> {
    if get_user_id(state, session).await?.is_some() {
        return Err(Error::redirect("/"));
    }
    Ok(())
}

/// Gate sensitive actions on a verification challenge completed within the
/// recent window; divert to the verify entry point otherwise.
pub fn require_recent_verification(session: &SessionContext) -> Result<(), Error> {
    if session.verified_recently(Utc::now())? {
        Ok(())
    } else {
        Err(Error::redirect(VERIFY_PATH))
    }
}

/// Build the login redirect, carrying the original path+query when a request
/// is supplied.
pub fn login_redirect(req: Option<&HttpRequest>) -> Error {
    let Some(req) = req else {
        return Error::redirect(LOGIN_PATH);
    };
    let path = req.path();
    let query = req.query_string();
    let return_to = if query.is_empty() {
        path.to_owned()
    } else {
        format!("{path}?{query}")
    };
    let params = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("redirectTo", &return_to)
        .finish();
    Error::redirect(format!("{LOGIN_PATH}?{params}"))
}

/// Clamp a caller-provided redirect target to same-site paths.
///
/// Anything that is not a plain absolute path (protocol-relative targets
/// included) collapses to the site root.
pub fn safe_redirect(candidate: Option<&str>) -> String {
    match candidate {
        Some(target) if target.starts_with('/') && !target.starts_with("//") => target.to_owned(),
        _ => "/".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, "/")]
    #[case(Some("/users/kody"), "/users/kody")]
    #[case(Some("https://evil.example.com"), "/")]
    #[case(Some("//evil.example.com"), "/")]
    #[case(Some("relative/path"), "/")]
    fn safe_redirect_clamps_offsite_targets(
        #[case] candidate: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(safe_redirect(candidate), expected);
    }

    #[actix_web::test]
    async fn login_redirect_carries_path_and_query() {
        let req = actix_web::test::TestRequest::get()
            .uri("/users?search=ko%20dy")
            .to_http_request();
        let err = login_redirect(Some(&req));
        let location = err.location().expect("redirect location");
        assert!(location.starts_with("/login?redirectTo="));
        assert!(location.contains("%2Fusers"));
        assert!(location.contains("search"));
    }

    #[actix_web::test]
    async fn login_redirect_without_request_is_bare() {
        let err = login_redirect(None);
        assert_eq!(err.location(), Some(LOGIN_PATH));
    }
}
