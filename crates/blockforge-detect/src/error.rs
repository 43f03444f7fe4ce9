//! Error types for the detection loop

use blockforge_config::ConfigError;
use blockforge_core::CoreError;
use blockforge_decomp::DecompError;
use thiserror::Error;

/// Errors raised while detecting decompositions.
#[derive(Debug, Error)]
pub enum DetectError {
    /// A refinement step failed
    #[error(transparent)]
    Decomp(#[from] DecompError),

    /// Invalid detection configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A classifier or index space operation failed
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The scoring thread pool could not be built
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type alias for detection operations
pub type Result<T> = std::result::Result<T, DetectError>;
