//! Typed failures for connection resolution

use thiserror::Error;

/// Errors raised while resolving a connection URL.
///
/// Query-level failures propagate as [`anyhow::Error`] straight from the
/// drivers; this type exists for the cases callers are expected to
/// distinguish. It stays downcastable through `anyhow`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A client/server URL is configured but the crate was built without the
    /// `postgres` feature. Fails fast rather than silently falling back to
    /// the embedded backend.
    #[error("connection URL '{0}' requires PostgreSQL support, but the `postgres` feature is not enabled")]
    DriverUnavailable(String),
}
