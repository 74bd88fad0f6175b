//! Error types for the Lumen3D engine
//!
//! This module defines the error type shared by the core crate and the
//! backends, plus the `engine_err!` family of macros that log an error
//! (with file:line) at the point where it is created.

use std::fmt;

/// Result type for Lumen3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Lumen3D engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (failed Vulkan call, device lost, ...)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (unknown name, wrong handle, mismatched signature, ...)
    InvalidResource(String),

    /// Initialization failed (instance, device, swapchain, validation layers)
    InitializationFailed(String),

    /// Image layout transition that is unsupported or starts from the wrong layout
    LayoutTransition(String),

    /// Frame protocol call made outside its phase
    InvalidState(String),

    /// Device capability missing (e.g. linear blit for mipmap generation)
    Unsupported(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::LayoutTransition(msg) => write!(f, "Layout transition error: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR (with file:line) and evaluate to `Error::BackendError`
///
/// # Example
///
/// ```no_run
/// # use lumen_3d_engine::engine_err;
/// let err = engine_err!("lumen3d::vulkan", "vkCreateImage failed: {}", -2);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::lumen3d::Error::BackendError(message)
    }};
}

/// Log an ERROR and return `Err(Error::BackendError)` from the current function
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

/// Log a WARN and evaluate to `Error::BackendError`
#[macro_export]
macro_rules! engine_warn_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_warn!($source, "{}", message);
        $crate::lumen3d::Error::BackendError(message)
    }};
}

/// Log a WARN and return `Err(Error::BackendError)` from the current function
#[macro_export]
macro_rules! engine_bail_warn {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_warn_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
