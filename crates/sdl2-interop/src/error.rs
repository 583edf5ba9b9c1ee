//! Error types shared by every SDL call

use crate::version::Version;
use sdl2_interop_config::ConfigError;
use thiserror::Error;

/// Errors surfaced by the binding layer
#[derive(Error, Debug)]
pub enum Error {
    /// The loaded library predates the export
    #[error("The SDL2 export '{symbol}' expected at least SDL v{required} but v{actual} was found.")]
    SymbolVersionMismatch {
        symbol: String,
        required: Version,
        actual: Version,
    },

    /// A native call returned its failure sentinel
    #[error("SDL error: {message}{}", .code.map(|c| format!(" (code {c})")).unwrap_or_default())]
    NativeOperationFailed { message: String, code: Option<i32> },

    /// A value handed to a marshaler has the wrong shape
    #[error("Invalid argument: expected {expected}, found {found}")]
    InvalidArgumentType { expected: String, found: String },

    /// An optional callback or state the operation relies on is absent
    #[error("Cannot {operation}: {reason}")]
    PreconditionNotMet { operation: String, reason: String },

    #[error("Failed to load SDL2 library '{library}': {reason}")]
    LibraryLoad { library: String, reason: String },

    #[error("SDL v{actual} is older than the configured minimum v{required}")]
    LibraryTooOld { required: Version, actual: Version },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for SDL operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn precondition(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::PreconditionNotMet {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_argument(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Error::InvalidArgumentType {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// True when the library is too old for a requested export
    pub fn is_version_mismatch(&self) -> bool {
        matches!(self, Error::SymbolVersionMismatch { .. })
    }
}
