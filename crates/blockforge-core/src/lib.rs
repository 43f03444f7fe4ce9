//! BlockForge Core - Core types and traits for matrix decomposition
//!
//! This crate provides the fundamental abstractions for BlockForge:
//! - The [`IndexSpace`] trait giving dense constraint/variable indices and
//!   row/column adjacency of a mixed-integer program
//! - [`ConstraintMatrix`], a sparse implementation of [`IndexSpace`]
//! - Constraint and variable classifiers used by detectors to seed assignments

pub mod classifier;
pub mod error;
pub mod space;

pub use classifier::{
    ConsClassDecision, ConsClassifier, IndexClassifier, VarClassDecision, VarClassifier,
};
pub use error::{CoreError, Result};
pub use space::{ConsKind, ConstraintMatrix, IndexSpace, MatrixBuilder, SpaceKind, VarType};
