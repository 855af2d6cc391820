//! Error types for the OGL buffer layer
//!
//! This module defines the error types used throughout the crate,
//! covering driver loading, buffer mapping and bind bracket misuse.

use std::fmt;
use crate::driver::{AccessMode, BufferId};

/// Result type for OGL buffer operations
pub type Result<T> = std::result::Result<T, Error>;

/// OGL buffer errors
#[derive(Debug, Clone)]
pub enum Error {
    /// The base driver is missing or below the minimum supported version.
    /// `code` is the driver's status code, passed through unchanged.
    DriverLoadError { code: u32 },

    /// The buffer already has a live mapping
    AlreadyMapped { buffer: BufferId },

    /// Indexed access past the element count of a mapped view
    OutOfRangeAccess { index: usize, len: usize },

    /// Unmap with nothing mapped, or a bind while already bound
    UnboundOperation(String),

    /// Read or write through a view whose access mode forbids it
    AccessViolation { access: AccessMode },

    /// The driver returned a null mapping. `code` is the driver error flag.
    MapFailed { code: u32 },

    /// Requested sub-range does not fit the buffer (or is misaligned)
    InvalidRange { offset: usize, length: usize, size: usize },

    /// Invalid resource (unusable target, zero-sized element type, ...)
    InvalidResource(String),

    /// Backend-specific error
    BackendError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DriverLoadError { code } => write!(f, "Driver load failed (code {})", code),
            Error::AlreadyMapped { buffer } => write!(f, "Buffer {} is already mapped", buffer),
            Error::OutOfRangeAccess { index, len } => {
                write!(f, "Mapped view index {} out of range (len: {})", index, len)
            }
            Error::UnboundOperation(msg) => write!(f, "Unbound operation: {}", msg),
            Error::AccessViolation { access } => {
                write!(f, "Access not permitted by a mapping with {:?} access", access)
            }
            Error::MapFailed { code } => write!(f, "Buffer mapping failed (driver error 0x{:04X})", code),
            Error::InvalidRange { offset, length, size } => write!(
                f,
                "Invalid range: offset {} length {} (buffer size {})",
                offset, length, size
            ),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an error through the runtime logger and evaluate to it
///
/// # Example
///
/// ```ignore
/// let err = ogl_err!("ogl::Buffer", Error::InvalidResource("no target".to_string()));
/// ```
#[macro_export]
macro_rules! ogl_err {
    ($source:expr, $err:expr) => {{
        let err: $crate::ogl::Error = $err;
        $crate::ogl_error!($source, "{}", err);
        err
    }};
}

/// Log an error and return it from the current function
///
/// # Example
///
/// ```ignore
/// if size_of::<T>() == 0 {
///     ogl_bail!("ogl::Buffer", Error::InvalidResource("zero-sized element".to_string()));
/// }
/// ```
#[macro_export]
macro_rules! ogl_bail {
    ($source:expr, $err:expr) => {
        return Err($crate::ogl_err!($source, $err))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
