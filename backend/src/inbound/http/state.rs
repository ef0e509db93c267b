//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they depend only
//! on domain services and repository ports, and stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccessRepository, AccountRepository, NoteRepository, SessionRepository,
    VerificationRepository,
};
use crate::domain::{AccessControl, Authenticator, ProviderRegistry, VerificationService};

/// Parameter object bundling every port implementation the HTTP layer needs.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub accounts: Arc<dyn AccountRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub access: Arc<dyn AccessRepository>,
    pub verifications: Arc<dyn VerificationRepository>,
    pub notes: Arc<dyn NoteRepository>,
    pub providers: ProviderRegistry,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub authenticator: Arc<Authenticator>,
    pub access: Arc<AccessControl>,
    pub verifications: Arc<VerificationService>,
    pub accounts: Arc<dyn AccountRepository>,
    pub notes: Arc<dyn NoteRepository>,
}

impl HttpState {
    /// Wire domain services over the supplied ports.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            accounts,
            sessions,
            access,
            verifications,
            notes,
            providers,
        } = ports;
        Self {
            authenticator: Arc::new(Authenticator::new(accounts.clone(), sessions, providers)),
            access: Arc::new(AccessControl::new(access)),
            verifications: Arc::new(VerificationService::new(verifications)),
            accounts,
            notes,
        }
    }
}
