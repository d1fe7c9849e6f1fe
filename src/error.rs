//! Error types for colfuse

use thiserror::Error;

use crate::table::{Column, Repr};

/// Result type alias using the colfuse Error
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure is local to the call that produced it.
///
/// No variant leaves a registry or column partially mutated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Zero-length request or the allocator refused the buffer
    #[error("Allocation error: cannot allocate {size} elements of {repr}")]
    Allocation { repr: Repr, size: usize },

    /// Representation tag outside the supported set
    #[error("Invalid representation tag: {0}")]
    InvalidRepresentation(u32),

    #[error("Index {index} out of bounds for column of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Malformed expression text; `position` is a byte offset
    #[error("Parse error at {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Type mismatch: {left} combined with {right}")]
    TypeMismatch { left: Repr, right: Repr },

    #[error("Length mismatch: {left} elements combined with {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Column already registered: {0}")]
    DuplicateName(String),

    /// Names must be identifiers so expressions can reference them
    #[error("Invalid column name: {0:?}")]
    InvalidName(String),

    /// Literal-only expressions have no length to broadcast to
    #[error("Expression references no column")]
    NoColumnOperand,

    /// Stale, destroyed, moved or foreign handle at the ABI boundary
    #[error("Invalid handle: {0:#x}")]
    InvalidHandle(u64),
}

impl Error {
    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            position,
            message: message.into(),
        }
    }
}

/// A refused registration, handing the column back to the caller.
///
/// Modeled after `std::sync::mpsc::SendError`: ownership never leaks
/// into a registry that rejected it.
#[derive(Debug)]
pub struct Rejected {
    pub error: Error,
    pub column: Column,
}

impl Rejected {
    pub fn into_column(self) -> Column {
        self.column
    }
}

impl std::fmt::Display for Rejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "registration rejected: {}", self.error)
    }
}

impl std::error::Error for Rejected {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<Rejected> for Error {
    fn from(rejected: Rejected) -> Self {
        rejected.error
    }
}
