//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports, backed by
//! PostgreSQL through `diesel-async` with `bb8` pooling.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types; no business logic lives here.
//! - **Internal models**: row structs (`models`) and table definitions
//!   (`schema`) never leak to the domain layer.
//! - **Stable errors**: driver failures map onto the shared
//!   [`crate::domain::ports::RepositoryError`] categories.

mod diesel_access_repository;
mod diesel_account_repository;
mod diesel_note_repository;
mod diesel_seed_repository;
mod diesel_session_repository;
mod diesel_verification_repository;
mod error_map;
mod models;
mod pool;
pub(crate) mod schema;

pub use diesel_access_repository::DieselAccessRepository;
pub use diesel_account_repository::DieselAccountRepository;
pub use diesel_note_repository::DieselNoteRepository;
pub use diesel_seed_repository::DieselSeedRepository;
pub use diesel_session_repository::DieselSessionRepository;
pub use diesel_verification_repository::DieselVerificationRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
