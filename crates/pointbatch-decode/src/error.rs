//! Error types for decoding operations.

use std::{fmt, io};

/// Errors that can occur while reading or decoding point records.
#[derive(Debug)]
pub enum DecodeError {
    /// The point file could not be opened or read.
    Io {
        /// What was being done when the error occurred.
        context: &'static str,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// The file ended before the expected number of bytes could be read.
    BufferTooSmall { expected: usize, actual: usize },
    /// The decode buffer could not be allocated.
    Allocation { bytes: usize },
    /// Invalid data format or structure.
    InvalidFormat {
        context: &'static str,
        detail: String,
    },
}

impl DecodeError {
    pub(crate) fn io(context: &'static str, source: io::Error) -> Self {
        Self::Io { context, source }
    }

    /// Whether this error means the source file does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { context, source } => write!(f, "failed to {context}: {source}"),
            Self::BufferTooSmall { expected, actual } => {
                write!(
                    f,
                    "buffer too small: expected {expected} bytes, got {actual}"
                )
            }
            Self::Allocation { bytes } => write!(f, "could not allocate {bytes} bytes"),
            Self::InvalidFormat { context, detail } => {
                write!(f, "invalid format in {context}: {detail}")
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
