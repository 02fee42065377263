//! Error types for container I/O and bit-string conversion.
//!
//! Every public operation in this crate reports failure through one of these
//! enums instead of panicking. The boundary functions in [`crate::writer`] and
//! [`crate::reader`] log the cause before handing the error back.

use thiserror::Error;

/// Failure while saving or loading a container file.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Underlying file system error (not found, permission denied, disk full).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file ended before a field was complete.
    #[error("truncated container: {field} needs {expected} bytes, only {available} available")]
    Truncated {
        field: &'static str,
        expected: u64,
        available: u64,
    },

    /// A variable-length field does not fit its 4-byte length prefix.
    #[error("{field} is {len} bytes, exceeds the u32 length prefix")]
    FieldTooLarge { field: &'static str, len: usize },
}

/// Failure while parsing a `'0'`/`'1'` string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BitStringError {
    #[error("invalid binary digit {found:?} at position {position}")]
    InvalidDigit { position: usize, found: char },
}

/// Type alias for Result with [`ContainerError`].
pub type Result<T> = std::result::Result<T, ContainerError>;
