//! Shared cache-control policies for HTTP handlers.

/// Image payloads are content-addressed by their random id and never change,
/// so clients may cache them for a year.
pub const PUBLIC_IMMUTABLE_ONE_YEAR: &str = "public, max-age=31536000, immutable";

/// Build the cache-control header tuple for immutable binary resources.
pub const fn immutable_resource_header() -> (&'static str, &'static str) {
    ("Cache-Control", PUBLIC_IMMUTABLE_ONE_YEAR)
}
