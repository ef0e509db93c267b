//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;

use crate::domain::{FixtureAuthProvider, ProviderRegistry};
use crate::test_support::MemoryRepository;

use super::state::{HttpState, HttpStatePorts};

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Build an [`HttpState`] over a shared in-memory store, returning the store
/// for direct arrangement and assertions.
pub fn memory_state() -> (HttpState, Arc<MemoryRepository>) {
    let store = Arc::new(MemoryRepository::new());
    let mut providers = ProviderRegistry::new();
    providers.register(Arc::new(FixtureAuthProvider::new("github")));
    let state = HttpState::new(HttpStatePorts {
        accounts: store.clone(),
        sessions: store.clone(),
        access: store.clone(),
        verifications: store.clone(),
        notes: store.clone(),
        providers,
    });
    (state, store)
}
