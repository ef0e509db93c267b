//! Pluggable external identity providers.
//!
//! Each provider implements a small capability interface: begin an
//! authentication round trip, then turn the callback into a normalised
//! identity. The authenticator only depends on this interface and the
//! name-keyed registry, never on a concrete provider.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::error::Error;

/// Normalised identity returned by a provider callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    pub provider_name: String,
    pub provider_id: String,
    pub email: String,
    pub username: Option<String>,
    pub name: Option<String>,
}

/// Capability interface for an external identity provider.
#[async_trait]
pub trait AuthProvider: Send + Sync + std::fmt::Debug {
    /// Registered provider name, e.g. `github`.
    fn name(&self) -> &str;

    /// Start an authentication round trip; returns the URL to divert the
    /// caller to. `state` is an opaque anti-forgery token echoed back on the
    /// callback.
    async fn begin(&self, state: &str) -> Result<String, Error>;

    /// Exchange the callback code for a normalised identity.
    async fn handle_callback(&self, code: &str) -> Result<ProviderIdentity, Error>;
}

/// Name-keyed provider registry.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn AuthProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own name. Later registrations replace
    /// earlier ones with the same name.
    pub fn register(&mut self, provider: Arc<dyn AuthProvider>) {
        self.providers.insert(provider.name().to_owned(), provider);
    }

    /// Look up a provider; unknown names are a client error.
    pub fn get(&self, name: &str) -> Result<Arc<dyn AuthProvider>, Error> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("unknown auth provider: {name}")))
    }
}

/// In-memory provider used by tests and local development.
///
/// Accepts any non-empty callback code and derives a stable identity from it.
#[derive(Debug, Clone)]
pub struct FixtureAuthProvider {
    name: String,
}

impl FixtureAuthProvider {
    /// Create a fixture provider registered under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl AuthProvider for FixtureAuthProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn begin(&self, state: &str) -> Result<String, Error> {
        Ok(format!(
            "https://auth.example.com/{}/authorize?state={state}",
            self.name
        ))
    }

    async fn handle_callback(&self, code: &str) -> Result<ProviderIdentity, Error> {
        if code.is_empty() {
            return Err(Error::invalid_request("callback code must not be empty"));
        }
        Ok(ProviderIdentity {
            provider_name: self.name.clone(),
            provider_id: code.to_owned(),
            email: format!("{code}@{}.example.com", self.name),
            username: Some(format!("{}_{code}", self.name)),
            name: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registry_dispatches_by_name() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(FixtureAuthProvider::new("github")));

        let provider = registry.get("github").expect("registered provider");
        let url = provider.begin("xyzzy").await.expect("begin url");
        assert!(url.contains("github"));
        assert!(url.contains("state=xyzzy"));

        let err = registry.get("gitlab").expect_err("unregistered provider");
        assert_eq!(err.code, crate::domain::ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn fixture_callback_yields_stable_identity() {
        let provider = FixtureAuthProvider::new("github");
        let identity = provider.handle_callback("abc123").await.expect("identity");
        assert_eq!(identity.provider_name, "github");
        assert_eq!(identity.provider_id, "abc123");
        assert_eq!(
            identity,
            provider.handle_callback("abc123").await.expect("identity")
        );
    }
}
