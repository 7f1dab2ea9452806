//! Error types for the meshlet HAL
//!
//! Every fallible operation returns [`Result`]. Errors are never retried:
//! they are either caller-input errors or unrecoverable backend errors, and
//! recovery (e.g. falling back to a non-mesh pipeline) is the caller's job.

use std::fmt;

/// Result type for meshlet HAL operations
pub type Result<T> = std::result::Result<T, Error>;

/// Meshlet HAL errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A device capability is missing or the request shape is not supported.
    /// Nothing was created or recorded.
    UnsupportedFeature(String),

    /// A native API call failed
    BackendFailure {
        /// What was being done when the call failed
        message: String,
        /// Raw native result code (e.g. `VkResult`)
        code: i32,
    },

    /// The caller passed a missing or inconsistent argument
    InvalidArgument(String),

    /// Out of GPU memory
    OutOfMemory,
}

impl Error {
    /// Returns true for [`Error::UnsupportedFeature`]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::UnsupportedFeature(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedFeature(msg) => write!(f, "Unsupported feature: {}", msg),
            Error::BackendFailure { message, code } => {
                write!(f, "Backend failure: {} (code {})", message, code)
            }
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
