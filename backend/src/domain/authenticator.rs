//! Authentication use-cases: credential verification and session lifecycle.
//!
//! The authenticator owns no storage. It talks to the credential and session
//! stores through ports, and to external identity providers through the
//! name-keyed registry, so handler tests can substitute stubs for all three.

use std::sync::Arc;

use chrono::Utc;

use super::auth::{
    LoginCredentials, NewAccount, NewConnectedAccount, Password, UserLookup, hash_password,
    verify_password,
};
use super::connection::Connection;
use super::error::Error;
use super::id::RecordId;
use super::ports::{AccountRepository, SessionRepository};
use super::provider::{AuthProvider, ProviderIdentity, ProviderRegistry};
use super::session::Session;
use super::user::{User, Username};

/// Authentication service over the credential and session stores.
#[derive(Clone)]
pub struct Authenticator {
    accounts: Arc<dyn AccountRepository>,
    sessions: Arc<dyn SessionRepository>,
    providers: ProviderRegistry,
}

impl Authenticator {
    /// Create an authenticator over the given stores and provider registry.
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        sessions: Arc<dyn SessionRepository>,
        providers: ProviderRegistry,
    ) -> Self {
        Self {
            accounts,
            sessions,
            providers,
        }
    }

    /// Look up a registered external identity provider by name.
    pub fn provider(&self, name: &str) -> Result<Arc<dyn AuthProvider>, Error> {
        self.providers.get(name)
    }

    /// Resolve a session identifier to its owning user id.
    ///
    /// Returns `None` when the session row is missing or expired; the caller
    /// decides whether that means "anonymous" or "stale cookie".
    pub async fn resolve_session(
        &self,
        session_id: &RecordId,
    ) -> Result<Option<RecordId>, Error> {
        let Some(session) = self.sessions.find(session_id).await? else {
            return Ok(None);
        };
        if !session.is_live(Utc::now()) {
            return Ok(None);
        }
        Ok(Some(session.user_id))
    }

    /// Verify credentials and open a session.
    ///
    /// Returns `None` for an unknown username, a passwordless account, and a
    /// wrong password alike; callers surface one generic failure message.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Option<Session>, Error> {
        let lookup = UserLookup::Username(credentials.username.clone());
        let Some(user_id) = self
            .verify_user_password(&lookup, &credentials.password)
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(self.open_session(user_id).await?))
    }

    /// Compare a plaintext password against the stored hash for a user found
    /// by username or id. `None` covers both "user missing" and "wrong
    /// password".
    pub async fn verify_user_password(
        &self,
        lookup: &UserLookup,
        password: &Password,
    ) -> Result<Option<RecordId>, Error> {
        let Some((user, Some(hash))) = self.accounts.find_user_with_password(lookup).await?
        else {
            return Ok(None);
        };
        if verify_password(&hash, password) {
            Ok(Some(user.id))
        } else {
            Ok(None)
        }
    }

    /// Create a user, its password row, and a session.
    pub async fn signup(&self, account: NewAccount) -> Result<Session, Error> {
        let hash = hash_password(&account.password)?;
        let user = User::create(account.email, account.username, account.name);
        self.accounts.create_user(&user).await?;
        self.accounts.create_password(&user.id, &hash).await?;
        self.open_session(user.id).await
    }

    /// Create a user, its provider connection row, and a session. Used for
    /// accounts originating from an external provider; no password row is
    /// written.
    pub async fn signup_with_connection(
        &self,
        account: NewConnectedAccount,
    ) -> Result<Session, Error> {
        let user = User::create(account.email, account.username, account.name);
        self.accounts.create_user(&user).await?;
        let connection =
            Connection::create(account.provider_name, account.provider_id, user.id.clone());
        self.accounts.create_connection(&connection).await?;
        self.open_session(user.id).await
    }

    /// Open a session for the local user linked to an external identity, or
    /// `None` when no connection exists yet.
    pub async fn login_with_connection(
        &self,
        identity: &ProviderIdentity,
    ) -> Result<Option<Session>, Error> {
        let connection = self
            .accounts
            .find_connection(&identity.provider_name, &identity.provider_id)
            .await?;
        match connection {
            Some(connection) => Ok(Some(self.open_session(connection.user_id).await?)),
            None => Ok(None),
        }
    }

    /// Rehash and replace the password for a username. `false` when the user
    /// is missing or has no password row.
    pub async fn reset_user_password(
        &self,
        username: &Username,
        password: &Password,
    ) -> Result<bool, Error> {
        let lookup = UserLookup::Username(username.clone());
        let Some((user, Some(_))) = self.accounts.find_user_with_password(&lookup).await? else {
            return Ok(false);
        };
        let hash = hash_password(password)?;
        Ok(self.accounts.update_password(&user.id, &hash).await?)
    }

    /// Best-effort session deletion during logout.
    ///
    /// A failed delete is swallowed: the cookie is destroyed regardless and
    /// an orphaned session row does no harm.
    pub async fn end_session(&self, session_id: &RecordId) {
        if let Err(error) = self.sessions.delete(session_id).await {
            tracing::debug!(%error, session_id = %session_id, "session delete during logout failed");
        }
    }

    async fn open_session(&self, user_id: RecordId) -> Result<Session, Error> {
        let session = Session::create(user_id, Utc::now());
        self.sessions.create(&session).await?;
        Ok(session)
    }
}
