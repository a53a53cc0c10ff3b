//! Error types for the pointbatch crate.

use std::{fmt, path::PathBuf};

/// Result type for pointbatch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading batches or building hierarchies.
#[derive(Debug)]
pub enum Error {
    /// The resolver could not find a file for the requested name.
    NotFound {
        /// The logical name that was requested.
        name: String,
    },
    /// A batch filename did not match `base.start-length-decimation.ext`.
    MalformedName {
        /// The name that failed to parse.
        name: String,
        /// Description of what was wrong.
        detail: String,
    },
    /// A configuration value could not be parsed.
    InvalidOption {
        /// The option key.
        key: String,
        /// The rejected value.
        value: String,
    },
    /// Record decoding failed.
    Decode(pointbatch_decode::DecodeError),
    /// Bounds cache operation failed.
    Cache {
        /// The operation that failed.
        operation: &'static str,
        /// The cache file involved.
        path: PathBuf,
        /// The error message.
        message: String,
    },
    /// Invalid input data.
    InvalidData {
        /// Context for where the error occurred.
        context: &'static str,
        /// Description of what was invalid.
        detail: String,
    },
}

impl Error {
    /// Whether this error is one that degrades to "not handled" rather than
    /// a failure worth reporting loudly.
    #[must_use]
    pub fn is_not_handled(&self) -> bool {
        match self {
            Error::NotFound { .. } | Error::MalformedName { .. } => true,
            Error::Decode(e) => e.is_not_found(),
            _ => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound { name } => write!(f, "no file found for {name}"),
            Error::MalformedName { name, detail } => {
                write!(f, "malformed batch name {name}: {detail}")
            }
            Error::InvalidOption { key, value } => {
                write!(f, "invalid value '{value}' for option {key}")
            }
            Error::Decode(e) => write!(f, "decode error: {e}"),
            Error::Cache {
                operation,
                path,
                message,
            } => {
                write!(f, "bounds cache {operation} of {} failed: {message}", path.display())
            }
            Error::InvalidData { context, detail } => {
                write!(f, "invalid {context}: {detail}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<pointbatch_decode::DecodeError> for Error {
    fn from(e: pointbatch_decode::DecodeError) -> Self {
        Error::Decode(e)
    }
}
