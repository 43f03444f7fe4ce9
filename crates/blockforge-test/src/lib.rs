//! Shared test fixtures for BlockForge crates.
//!
//! - [`matrices`] - small constraint matrices with known block structure
//! - `strategies` - proptest strategies for random patterns (`proptest` feature)
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! blockforge-test = { workspace = true }
//! ```

pub mod matrices;
#[cfg(feature = "proptest")]
pub mod strategies;

pub use matrices::{bin_packing, linked_pair, pattern, staircase, two_blocks};

#[cfg(feature = "proptest")]
pub use strategies::pattern_strategy;
