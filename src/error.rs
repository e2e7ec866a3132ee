//! Error types for the sensor-info-cache crate.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// A different cache instance is already registered with the router.
    ///
    /// At most one cache may receive routed samples at a time. Callers that
    /// consider this unrecoverable can treat the error as fatal; hosts that
    /// construct caches speculatively (tests, hot-swap UIs) can back off and
    /// retry once the previous instance is dropped.
    #[error("a sensor cache is already registered")]
    AlreadyRegistered,
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
