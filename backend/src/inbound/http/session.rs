//! Cookie-session wrapper keeping handlers free of framework specifics.
//!
//! The cookie never carries credentials. It holds the server-side session
//! identifier, a pending (pre-2FA) session identifier during a two-factor
//! login, the instant of the last completed verification challenge, and the
//! username stashed between password-reset steps.

use actix_session::Session as CookieSession;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use chrono::{DateTime, Duration, Utc};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, RecordId, Session, Username};

pub(crate) const SESSION_ID_KEY: &str = "session_id";
pub(crate) const UNVERIFIED_SESSION_ID_KEY: &str = "unverified_session_id";
pub(crate) const VERIFIED_AT_KEY: &str = "verified_at";
pub(crate) const RESET_USERNAME_KEY: &str = "reset_username";

/// How long a completed verification challenge keeps gating sensitive
/// actions open.
pub const RECENT_VERIFICATION_WINDOW_HOURS: i64 = 2;

/// Newtype wrapper exposing higher-level session-cookie operations.
#[derive(Clone)]
pub struct SessionContext(CookieSession);

impl SessionContext {
    /// Construct a wrapper from the underlying Actix session.
    pub fn new(session: CookieSession) -> Self {
        Self(session)
    }

    fn read_id(&self, key: &str) -> Result<Option<RecordId>, Error> {
        let raw = self
            .0
            .get::<String>(key)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        match raw {
            Some(raw) => match RecordId::new(raw) {
                Ok(id) => Ok(Some(id)),
                Err(error) => {
                    tracing::warn!(%error, key, "invalid identifier in session cookie");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    fn insert(&self, key: &str, value: impl serde::Serialize) -> Result<(), Error> {
        self.0
            .insert(key, value)
            .map_err(|error| Error::internal(format!("failed to write session: {error}")))
    }

    /// The server-side session identifier, if the caller has one.
    pub fn session_id(&self) -> Result<Option<RecordId>, Error> {
        self.read_id(SESSION_ID_KEY)
    }

    /// Bind the cookie to a fully authenticated session.
    pub fn persist_session(&self, session: &Session) -> Result<(), Error> {
        self.0.remove(UNVERIFIED_SESSION_ID_KEY);
        self.insert(SESSION_ID_KEY, session.id.as_ref())
    }

    /// Stash a session that still awaits its two-factor code.
    pub fn stash_unverified_session(&self, session: &Session) -> Result<(), Error> {
        self.insert(UNVERIFIED_SESSION_ID_KEY, session.id.as_ref())
    }

    /// The pending pre-2FA session identifier, if any.
    pub fn unverified_session_id(&self) -> Result<Option<RecordId>, Error> {
        self.read_id(UNVERIFIED_SESSION_ID_KEY)
    }

    /// Promote the stashed pre-2FA session to the authenticated one.
    pub fn promote_unverified_session(&self) -> Result<Option<RecordId>, Error> {
        let Some(id) = self.unverified_session_id()? else {
            return Ok(None);
        };
        self.0.remove(UNVERIFIED_SESSION_ID_KEY);
        self.insert(SESSION_ID_KEY, id.as_ref())?;
        Ok(Some(id))
    }

    /// Record that the caller completed a verification challenge at `now`.
    pub fn stamp_verified(&self, now: DateTime<Utc>) -> Result<(), Error> {
        self.insert(VERIFIED_AT_KEY, now.timestamp())
    }

    /// Whether a verification challenge was completed within the recent
    /// window.
    pub fn verified_recently(&self, now: DateTime<Utc>) -> Result<bool, Error> {
        let stamped = self
            .0
            .get::<i64>(VERIFIED_AT_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        let Some(stamp) = stamped else {
            return Ok(false);
        };
        let Some(verified_at) = DateTime::<Utc>::from_timestamp(stamp, 0) else {
            return Ok(false);
        };
        Ok(now - verified_at < Duration::hours(RECENT_VERIFICATION_WINDOW_HOURS)
            && verified_at <= now)
    }

    /// Stash the username whose password reset was just verified.
    pub fn set_reset_username(&self, username: &Username) -> Result<(), Error> {
        self.insert(RESET_USERNAME_KEY, username.as_ref())
    }

    /// Take (read and clear) the stashed reset username.
    pub fn take_reset_username(&self) -> Result<Option<String>, Error> {
        let username = self
            .0
            .get::<String>(RESET_USERNAME_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        self.0.remove(RESET_USERNAME_KEY);
        Ok(username)
    }

    /// Destroy the cookie-side session entirely.
    pub fn clear(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = CookieSession::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
