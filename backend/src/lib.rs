//! Notes application backend library.
//!
//! Layout follows ports-and-adapters: `domain` holds entities, services, and
//! repository traits; `inbound` the HTTP adapter; `outbound` the Diesel
//! persistence adapters; `seeding` the operational seed scenario shared by
//! the seed binary and its tests.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod seeding;
#[cfg(test)]
pub(crate) mod test_support;

/// Request-tracing middleware re-exported at the crate root.
pub use middleware::Trace;
/// Public OpenAPI surface used by tooling.
pub use doc::ApiDoc;
