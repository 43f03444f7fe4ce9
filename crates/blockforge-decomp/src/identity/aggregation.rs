//! Grouping identical blocks into representative classes.

use blockforge_config::AggregationConfig;
use tracing::debug;

use super::blocks::{Identity, IsomorphismOracle};
use crate::partial::PartialDecomposition;

/// Classes of identical blocks; each class is represented by its first
/// block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationInfo {
    blocks_for_rep: Vec<Vec<usize>>,
    rep_for_block: Vec<usize>,
    too_expensive: bool,
}

impl AggregationInfo {
    /// Every block is its own representative.
    fn singletons(n_blocks: usize) -> Self {
        Self {
            blocks_for_rep: (0..n_blocks).map(|b| vec![b]).collect(),
            rep_for_block: (0..n_blocks).collect(),
            too_expensive: false,
        }
    }

    pub fn n_reps(&self) -> usize {
        self.blocks_for_rep.len()
    }

    /// Representative class of `block`.
    pub fn rep_for_block(&self, block: usize) -> Option<usize> {
        self.rep_for_block.get(block).copied()
    }

    /// Blocks in class `rep`, ascending; empty for unknown classes.
    pub fn blocks_for_rep(&self, rep: usize) -> &[usize] {
        self.blocks_for_rep.get(rep).map_or(&[], Vec::as_slice)
    }

    /// True if some pair of blocks could not be compared within budget.
    pub fn is_too_expensive(&self) -> bool {
        self.too_expensive
    }
}

impl PartialDecomposition<'_> {
    /// Groups blocks into classes of identical blocks without caching.
    ///
    /// Only complete decompositions without linking or stairlinking
    /// variables are aggregated; otherwise every block forms its own class.
    /// Each block is compared with the representative of every existing
    /// class: first trivially, then through `oracle`, then by brute force if
    /// the block is small enough and brute force has not given up before.
    pub(crate) fn compute_aggregation_information(
        &self,
        config: &AggregationConfig,
        oracle: Option<&dyn IsomorphismOracle>,
    ) -> AggregationInfo {
        let aggregatable = config.enabled
            && self.is_complete()
            && self.n_linking_vars() == 0
            && self.n_total_stairlinking_vars() == 0;
        if !aggregatable {
            return AggregationInfo::singletons(self.n_blocks);
        }

        let allow_brute = !self.caches.agg_too_expensive;
        let mut info = AggregationInfo {
            blocks_for_rep: Vec::new(),
            rep_for_block: vec![0; self.n_blocks],
            too_expensive: false,
        };
        for block in 0..self.n_blocks {
            let mut found = None;
            for (rep, members) in info.blocks_for_rep.iter().enumerate() {
                let candidate = members[0];
                let identity = self.identity_of(candidate, block, config, oracle, allow_brute);
                match identity {
                    Identity::Identical => {
                        found = Some(rep);
                        break;
                    }
                    Identity::TooExpensive => info.too_expensive = true,
                    Identity::NotIdentical | Identity::Undecided => {}
                }
            }
            let rep = match found {
                Some(rep) => {
                    info.blocks_for_rep[rep].push(block);
                    rep
                }
                None => {
                    info.blocks_for_rep.push(vec![block]);
                    info.blocks_for_rep.len() - 1
                }
            };
            info.rep_for_block[block] = rep;
        }
        info
    }

    fn identity_of(
        &self,
        block1: usize,
        block2: usize,
        config: &AggregationConfig,
        oracle: Option<&dyn IsomorphismOracle>,
        allow_brute: bool,
    ) -> Identity {
        let checked = match oracle {
            Some(oracle) => self.check_identical_blocks_oracle(block1, block2, oracle),
            None => self.check_identical_blocks_trivial(block1, block2),
        };
        match checked {
            Ok(Identity::Undecided) => {}
            Ok(decided) => return decided,
            Err(_) => return Identity::NotIdentical,
        }
        let small = self.n_vars_for_block(block1) <= config.brute_force_max_vars;
        if !allow_brute || !small {
            return Identity::TooExpensive;
        }
        self.check_identical_blocks_brute(block1, block2, config.brute_force_node_limit)
            .unwrap_or(Identity::NotIdentical)
    }

    /// Computes and caches the classes of identical blocks.
    ///
    /// Returns the cached classes if nothing changed since the last call.
    /// Once brute force runs out of budget the decomposition stops trying
    /// it for good; see [`is_agg_info_too_expensive`].
    ///
    /// [`is_agg_info_too_expensive`]: Self::is_agg_info_too_expensive
    pub fn calc_aggregation_information(
        &mut self,
        config: &AggregationConfig,
        oracle: Option<&dyn IsomorphismOracle>,
    ) -> &AggregationInfo {
        let generation = self.generation;
        let info = match self.caches.aggregation.get(generation) {
            Some(info) => info.clone(),
            None => {
                let info = self.compute_aggregation_information(config, oracle);
                if info.too_expensive {
                    self.caches.agg_too_expensive = true;
                }
                debug!(
                    decomposition = self.id,
                    blocks = self.n_blocks,
                    reps = info.n_reps(),
                    too_expensive = info.too_expensive,
                    "aggregation information"
                );
                info
            }
        };
        self.caches.aggregation.set(generation, info)
    }

    /// Cached aggregation information, if current.
    pub fn aggregation_info(&self) -> Option<&AggregationInfo> {
        self.caches.aggregation.get(self.generation)
    }

    /// True once an identical-block check exhausted its budget.
    pub fn is_agg_info_too_expensive(&self) -> bool {
        self.caches.agg_too_expensive
    }
}
