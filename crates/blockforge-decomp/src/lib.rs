//! BlockForge Decomp - Partial decompositions of constraint matrices
//!
//! A [`PartialDecomposition`] splits the constraints of a mixed-integer
//! program into a master problem and independent blocks, and its variables
//! into master, block, linking and stairlinking variables. This crate holds
//! everything that operates on a single decomposition:
//!
//! - the assignment state with two-phase booking ([`partial`])
//! - refinement and completion procedures
//! - scores rating a decomposition ([`ScoreType`] selects one)
//! - hashing, equality and identical-block aggregation ([`identity`])
//! - the detector lineage ([`lineage`])
//! - DEC file export
//!
//! [`ScoreType`]: blockforge_config::ScoreType

pub mod error;
pub mod identity;
pub mod lineage;
pub mod partial;
pub mod score;

mod dec;
mod memo;
mod refine;

pub use error::{DecompError, Result};
pub use identity::{AggregationInfo, Identity, IsomorphismOracle};
pub use lineage::{DetectorRef, Lineage, LineageStep, UserGiven};
pub use partial::{ConsAssignment, PartialDecomposition, VarAssignment};
pub use score::NonzeroCounts;
