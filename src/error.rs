//! Error type shared by every table operation.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Requested capacity exceeds [`MAX_CAPACITY`](crate::MAX_CAPACITY).
    #[error("illegal capacity: {0}")]
    IllegalCapacity(usize),

    /// Load factor is zero, negative or NaN.
    #[error("illegal load factor: {0}")]
    IllegalLoadFactor(f32),

    /// The table changed underneath a cursor or a running callback.
    #[error("table was modified during traversal")]
    ConcurrentModification,

    #[error("illegal cursor state: {0}")]
    IllegalState(&'static str),

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// A serialized table failed validation.
    #[error("corrupt table data: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
