//! BlockForge Detect - Detection loop over partial decompositions
//!
//! This crate explores the space of decompositions of one index space:
//! - The [`Detector`] trait and two reference detectors
//! - [`CandidatePool`] deduplicating candidates by hash and equality
//! - [`DetectionLoop`] running rounds of propagation, finishing and scoring
//! - Termination conditions and run statistics

pub mod detector;
pub mod detectors;
pub mod driver;
pub mod error;
pub mod pool;
pub mod scope;
pub mod stats;
pub mod termination;

pub use detector::{successor, Detector, IdSource};
pub use detectors::{build_detectors, ConnectedDetector, ConsClassDetector};
pub use driver::{DetectionLoop, DetectionResult};
pub use error::{DetectError, Result};
pub use pool::CandidatePool;
pub use scope::DetectionScope;
pub use stats::DetectionStats;
pub use termination::{
    AndTermination, CandidateCountTermination, ExternalTermination, OrTermination,
    RoundCountTermination, Termination, TimeTermination,
};
