//! Domain entities, validated primitives, and use-case services.
//!
//! Purpose: keep every business rule transport- and store-agnostic. Inbound
//! adapters parse payloads into these types before touching a service, and
//! services reach storage only through the traits in [`ports`].

pub mod access;
pub mod access_control;
pub mod auth;
pub mod authenticator;
pub mod connection;
pub mod error;
pub mod export;
pub mod id;
pub mod note;
pub mod ports;
pub mod provider;
pub mod session;
pub mod user;
pub mod verification;
pub mod verification_service;

pub use self::access::{Permission, PermissionSpec, PermissionSpecError, Role};
pub use self::access_control::AccessControl;
pub use self::auth::{
    LoginCredentials, NewAccount, NewConnectedAccount, Password, PasswordValidationError,
    UserLookup, hash_password, verify_password,
};
pub use self::authenticator::Authenticator;
pub use self::connection::Connection;
pub use self::error::{Error, ErrorCode};
pub use self::export::{NoteExport, UserExport};
pub use self::id::{IdValidationError, RecordId};
pub use self::note::{
    ImageData, ImageMetadata, NewImage, Note, NoteValidationError, validate_note_body,
};
pub use self::provider::{AuthProvider, FixtureAuthProvider, ProviderIdentity, ProviderRegistry};
pub use self::session::{SESSION_TTL_DAYS, Session};
pub use self::user::{Email, User, UserListing, UserValidationError, Username};
pub use self::verification::{UnknownVerificationKind, Verification, VerificationKind};
pub use self::verification_service::VerificationService;

/// Convenient result alias for domain operations.
pub type ApiResult<T> = Result<T, Error>;
