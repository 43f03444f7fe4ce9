//! Error types for partial decompositions

use thiserror::Error;

/// Error raised by an operation whose preconditions do not hold.
///
/// None of these leave a decomposition half-modified: every check runs
/// before the first mutation.
#[derive(Debug, Error)]
pub enum DecompError {
    /// A constraint or variable index outside the index space
    #[error("{what} index {index} out of range (size {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// Booking or deleting an index that is no longer open
    #[error("{what} {index} is not open")]
    NotOpen { what: &'static str, index: usize },

    /// A block id at or past the current block count
    #[error("block {block} out of range ({n_blocks} blocks)")]
    BlockOutOfRange { block: usize, n_blocks: usize },

    /// Invalid operation for the current assignment state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// An operation that needs every index assigned
    #[error("decomposition {id} is incomplete ({open_conss} open constraints, {open_vars} open variables)")]
    Incomplete {
        id: usize,
        open_conss: usize,
        open_vars: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for decomposition operations
pub type Result<T> = std::result::Result<T, DecompError>;
