//! Configuration system for BlockForge.
//!
//! Load detection configuration from TOML or YAML files to control score
//! weights, block aggregation limits and the detection loop without code
//! changes.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use blockforge_config::{DetectionConfig, ScoreType};
//! use std::time::Duration;
//!
//! let config = DetectionConfig::from_toml_str(r#"
//!     [scoring]
//!     score_type = "classic"
//!     benders_penalty = 0.5
//!
//!     [detection]
//!     max_rounds = 2
//!     seconds_spent_limit = 30
//!
//!     [[detectors]]
//!     type = "cons_class"
//!     max_classes = 4
//!
//!     [[detectors]]
//!     type = "connected"
//! "#).unwrap();
//!
//! assert_eq!(config.scoring.score_type, ScoreType::Classic);
//! assert_eq!(config.time_limit(), Some(Duration::from_secs(30)));
//! assert_eq!(config.detectors.len(), 2);
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use blockforge_config::DetectionConfig;
//!
//! let config = DetectionConfig::load("detection.toml").unwrap_or_default();
//! // Proceeds with defaults if file doesn't exist
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;


/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main detection configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DetectionConfig {
    /// Score weights and the score used to rank candidates.
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Identical-block detection limits.
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Detection loop limits.
    #[serde(default)]
    pub detection: LoopConfig,

    /// Detectors to run, in order. Empty means the default set.
    #[serde(default)]
    pub detectors: Vec<DetectorConfig>,
}

impl DetectionConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the score used to rank candidates.
    pub fn with_score_type(mut self, score_type: ScoreType) -> Self {
        self.scoring.score_type = score_type;
        self
    }

    /// Sets the number of detection rounds.
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.detection.max_rounds = rounds;
        self
    }

    /// Sets the detection time limit.
    pub fn with_termination_seconds(mut self, seconds: u64) -> Self {
        self.detection.seconds_spent_limit = Some(seconds);
        self
    }

    /// Caps the number of finished candidates kept.
    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.detection.pool_capacity = Some(capacity);
        self
    }

    /// Adds a detector configuration.
    pub fn with_detector(mut self, detector: DetectorConfig) -> Self {
        self.detectors.push(detector);
        self
    }

    /// Returns the detection time limit, if configured.
    pub fn time_limit(&self) -> Option<Duration> {
        self.detection.time_limit()
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate()?;
        if self.aggregation.brute_force_node_limit == 0 {
            return Err(ConfigError::Invalid(
                "aggregation.brute_force_node_limit must be positive".to_string(),
            ));
        }
        if self.detection.pool_capacity == Some(0) {
            return Err(ConfigError::Invalid(
                "detection.pool_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Score function used to rank complete decompositions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreType {
    /// Weighted border area, linking and density score.
    Classic,
    /// Fraction of the matrix outside blocks and border.
    MaxWhite,
    /// Max-white of the reformulated problem with copied linking variables.
    #[default]
    MaxForeseeingWhite,
    /// Max-foreseeing-white counting identical blocks once.
    MaxForeseeingWhiteAggregated,
    /// Suitability for Benders reformulation.
    Benders,
    /// Max-foreseeing-white with a bonus for set partitioning masters.
    SetPartForeseeingWhite,
}

impl ScoreType {
    /// All score types, in declaration order.
    pub const ALL: [ScoreType; 6] = [
        ScoreType::Classic,
        ScoreType::MaxWhite,
        ScoreType::MaxForeseeingWhite,
        ScoreType::MaxForeseeingWhiteAggregated,
        ScoreType::Benders,
        ScoreType::SetPartForeseeingWhite,
    ];

    /// Snake-case name as used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            ScoreType::Classic => "classic",
            ScoreType::MaxWhite => "max_white",
            ScoreType::MaxForeseeingWhite => "max_foreseeing_white",
            ScoreType::MaxForeseeingWhiteAggregated => "max_foreseeing_white_aggregated",
            ScoreType::Benders => "benders",
            ScoreType::SetPartForeseeingWhite => "set_part_foreseeing_white",
        }
    }

    /// Dense index, used to address per-type caches.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ScoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScoreType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScoreType::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| ConfigError::Invalid(format!("unknown score type: {s}")))
    }
}

/// Score weights and parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ScoringConfig {
    /// Score used to rank complete decompositions.
    pub score_type: ScoreType,

    /// Classic score weight of the border area term.
    pub border_area_weight: f64,

    /// Classic score weight of the linking term.
    pub linking_weight: f64,

    /// Classic score weight of the block density term.
    pub density_weight: f64,

    /// Benders score factor on the master interference term.
    pub benders_penalty: f64,

    /// Weight of max-foreseeing-white in the set partitioning score; the
    /// bonus gets the remaining weight.
    pub setpart_weight: f64,

    /// A single block holding at least this fraction of all constraints
    /// makes a decomposition trivial.
    pub trivial_block_fraction: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            score_type: ScoreType::default(),
            border_area_weight: 0.6,
            linking_weight: 0.2,
            density_weight: 0.2,
            benders_penalty: 1.0,
            setpart_weight: 0.5,
            trivial_block_fraction: 0.95,
        }
    }
}

impl ScoringConfig {
    /// Checks weights and fractions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("border_area_weight", self.border_area_weight),
            ("linking_weight", self.linking_weight),
            ("density_weight", self.density_weight),
            ("benders_penalty", self.benders_penalty),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "scoring.{name} must be a nonnegative number, got {value}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.setpart_weight) {
            return Err(ConfigError::Invalid(format!(
                "scoring.setpart_weight must lie in [0, 1], got {}",
                self.setpart_weight
            )));
        }
        if !(self.trivial_block_fraction > 0.0 && self.trivial_block_fraction <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "scoring.trivial_block_fraction must lie in (0, 1], got {}",
                self.trivial_block_fraction
            )));
        }
        Ok(())
    }
}

/// Identical-block detection limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AggregationConfig {
    /// Whether the loop computes aggregation information for finished
    /// candidates.
    pub enabled: bool,

    /// Blocks with more variables than this skip the brute-force search.
    pub brute_force_max_vars: usize,

    /// Search nodes the brute-force check may visit per block pair.
    pub brute_force_node_limit: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            brute_force_max_vars: 64,
            brute_force_node_limit: 10_000,
        }
    }
}

/// Thread count for parallel candidate scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadCount {
    /// Use the global rayon pool.
    #[default]
    Auto,

    /// Score on the calling thread.
    None,

    /// Specific number of threads.
    Count(usize),
}

/// Detection loop limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct LoopConfig {
    /// Rounds of propagation over the open candidates.
    pub max_rounds: usize,

    /// Maximum seconds to spend detecting.
    pub seconds_spent_limit: Option<u64>,

    /// Maximum number of finished candidates kept, best first.
    pub pool_capacity: Option<usize>,

    /// Whether finished candidates get master-to-block postprocessing.
    pub postprocess: bool,

    /// Threads used for scoring finished candidates.
    pub threads: ThreadCount,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_rounds: 2,
            seconds_spent_limit: None,
            pool_capacity: None,
            postprocess: true,
            threads: ThreadCount::Auto,
        }
    }
}

impl LoopConfig {
    /// Returns the time limit as a Duration, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        self.seconds_spent_limit
            .filter(|&s| s > 0)
            .map(Duration::from_secs)
    }
}

/// Detector configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetectorConfig {
    /// Completes candidates by connected components.
    Connected,

    /// Sends constraint classes to the master problem.
    ConsClass(ConsClassDetectorConfig),
}

/// Constraint class detector configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ConsClassDetectorConfig {
    /// Classifiers with more classes are reduced to this many first.
    pub max_classes: usize,
}

impl Default for ConsClassDetectorConfig {
    fn default() -> Self {
        Self { max_classes: 5 }
    }
}
