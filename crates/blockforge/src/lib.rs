//! BlockForge - Dantzig-Wolfe structure detection in Rust
//!
//! Finds block structure in the constraint matrix of a mixed-integer
//! program: constraints go to a master problem or to independent blocks,
//! variables become master, block, linking or stairlinking variables.
//!
//! # Example
//!
//! ```rust
//! use blockforge::prelude::*;
//!
//! let mut builder = MatrixBuilder::new();
//! for name in ["x0", "x1", "x2", "x3"] {
//!     builder.add_binary(name).unwrap();
//! }
//! builder.add_cons("c0", &[(0, 1.0), (1, 1.0)], f64::NEG_INFINITY, 1.0).unwrap();
//! builder.add_cons("c1", &[(2, 1.0), (3, 1.0)], f64::NEG_INFINITY, 1.0).unwrap();
//! let matrix = builder.build();
//!
//! let result = blockforge::detect_with(&matrix, DetectionConfig::default()).unwrap();
//! let best = result.best().unwrap();
//! assert_eq!(best.n_blocks(), 2);
//! assert_eq!(best.n_linking_vars(), 0);
//! ```

// Index spaces and classifiers
pub use blockforge_core::{
    ConsClassDecision, ConsClassifier, ConsKind, ConstraintMatrix, CoreError, IndexClassifier,
    IndexSpace, MatrixBuilder, SpaceKind, VarClassDecision, VarClassifier, VarType,
};

// Configuration
pub use blockforge_config::{
    AggregationConfig, ConfigError, ConsClassDetectorConfig, DetectionConfig, DetectorConfig,
    LoopConfig, ScoreType, ScoringConfig, ThreadCount,
};

// Decompositions
pub use blockforge_decomp::{
    AggregationInfo, ConsAssignment, DecompError, DetectorRef, Identity, IsomorphismOracle,
    Lineage, PartialDecomposition, UserGiven, VarAssignment,
};

// Detection
pub use blockforge_detect::{
    termination, CandidatePool, ConnectedDetector, ConsClassDetector, DetectError,
    DetectionLoop, DetectionResult, DetectionStats, Detector, IdSource,
};

#[cfg(feature = "console")]
pub mod console;

mod detect;
pub use detect::{detect, detect_with, CONFIG_FILE};

pub mod prelude {
    pub use super::{
        ConstraintMatrix, DetectionConfig, DetectionLoop, Detector, IndexSpace, MatrixBuilder,
        PartialDecomposition, ScoreType, VarType,
    };
}
