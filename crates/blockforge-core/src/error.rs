//! Error types for BlockForge core

use thiserror::Error;

/// Main error type for index-space and classifier operations
#[derive(Debug, Error)]
pub enum CoreError {
    /// A constraint or variable index outside its dense range
    #[error("{what} index {index} out of range (size {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// A name registered twice in the same index space
    #[error("Duplicate {what} name: {name}")]
    DuplicateName { what: &'static str, name: String },

    /// A class id that the classifier does not know
    #[error("Unknown class {class} (classifier has {n_classes})")]
    UnknownClass { class: usize, n_classes: usize },

    /// Malformed matrix input
    #[error("Invalid matrix: {0}")]
    InvalidMatrix(String),
}

/// Result type alias for BlockForge core operations
pub type Result<T> = std::result::Result<T, CoreError>;
