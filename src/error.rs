//! Crate-wide error taxonomy.

use thiserror::Error;

/// Failure classes surfaced by the abstraction layer.
///
/// Format, geometry and range violations are programmer errors and fail fast
/// at the boundary where they occur; device-communication failures are
/// recovered locally where an operation is best-effort (parameter refresh,
/// class registration) and surfaced everywhere else.
#[derive(Error, Debug)]
pub enum HalError {
    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown parameter: {0}")]
    KeyNotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Device communication failed: {0}")]
    DeviceCommunication(String),
}

pub type Result<T> = std::result::Result<T, HalError>;
