//! Error type shared by every table face.

use thiserror::Error;

/// Coarse classification of a [`TableError`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// Rejected before any mutation: bad sizes, ill-shaped keys, destroyed table.
    InvalidArgument,
    /// The slot array or an entry buffer could not be allocated.
    AllocationFailure,
    /// A probe sequence could not place an entry even after a resize.
    TableExhausted,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TableError {
    #[error("key size must be non-zero")]
    ZeroKeySize,
    #[error("maximum key length must be non-zero")]
    ZeroMaxKeyLen,
    #[error("value size must be non-zero")]
    ZeroValueSize,
    #[error("capacity must be non-zero")]
    ZeroCapacity,
    #[error("load factor must lie strictly between 0 and 1, got {0}")]
    InvalidLoadFactor(f64),
    #[error("key is {got} bytes, table expects {expected}")]
    KeyLength { expected: usize, got: usize },
    #[error("value is {got} bytes, table expects {expected}")]
    ValueLength { expected: usize, got: usize },
    #[error("key is {len} bytes, keys must be shorter than {max}")]
    KeyTooLong { len: usize, max: usize },
    #[error("key contains a NUL byte")]
    KeyContainsNul,
    #[error("capacity {requested} cannot hold {count} entries below the load factor")]
    CapacityTooSmall { requested: usize, count: usize },
    #[error("table has been destroyed")]
    Destroyed,
    #[error("failed to allocate {bytes} bytes")]
    AllocationFailure { bytes: usize },
    #[error("probe sequence exhausted at capacity {capacity}")]
    Exhausted { capacity: usize },
}

impl TableError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TableError::AllocationFailure { .. } => ErrorKind::AllocationFailure,
            TableError::Exhausted { .. } => ErrorKind::TableExhausted,
            _ => ErrorKind::InvalidArgument,
        }
    }
}
