//! Driven ports: repository traits the domain services depend on.
//!
//! In hexagonal terms these are *driven* ports: the domain calls them and the
//! persistence layer implements them. Handler tests substitute in-memory
//! stubs instead of wiring a database.

mod access_repository;
mod account_repository;
mod note_repository;
mod seed_repository;
mod session_repository;
mod verification_repository;

pub use access_repository::AccessRepository;
pub use account_repository::AccountRepository;
pub use note_repository::NoteRepository;
pub use seed_repository::SeedRepository;
pub use session_repository::SessionRepository;
pub use verification_repository::VerificationRepository;

use serde_json::json;

use super::error::Error;

/// Persistence failure shared by every repository port.
///
/// Adapters map driver errors into these three categories; the domain maps
/// them onward to transport-agnostic errors via [`From`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// The store could not be reached or a connection checkout failed.
    #[error("store connection failed: {message}")]
    Connection { message: String },
    /// A statement failed for reasons other than uniqueness.
    #[error("store query failed: {message}")]
    Query { message: String },
    /// A uniqueness constraint rejected the write.
    #[error("duplicate value for {constraint}")]
    Duplicate { constraint: String },
}

impl RepositoryError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Create a duplicate error naming the violated constraint.
    pub fn duplicate(constraint: impl Into<String>) -> Self {
        Self::Duplicate {
            constraint: constraint.into(),
        }
    }
}

impl From<RepositoryError> for Error {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Connection { message } => Self::service_unavailable(message),
            RepositoryError::Query { message } => Self::internal(message),
            RepositoryError::Duplicate { constraint } => {
                Self::conflict("value already exists")
                    .with_details(json!({ "constraint": constraint }))
            }
        }
    }
}
