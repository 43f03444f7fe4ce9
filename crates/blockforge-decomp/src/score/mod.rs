//! Scores rating how well a decomposition suits Dantzig-Wolfe reformulation.
//!
//! All scores lie in `[0, 1]`, higher is better. On a partial decomposition
//! open constraints count as master constraints and open variables as
//! linking variables, so a score is a pessimistic estimate of every
//! completion.

mod benders;
mod classic;
mod setpart;
mod white;


use blockforge_config::ScoreType;

use crate::partial::{PartialDecomposition, VarSlot};

/// Coefficient counts per block and for the master rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NonzeroCounts {
    /// Coefficients of block rows on that block's own and stairlinking columns.
    pub blocks: Vec<usize>,
    /// Coefficients of master rows on all columns.
    pub master: usize,
}

/// Clamps a ratio into `[0, 1]`; non-finite values become 0.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// `num / den`, or 0 if `den` is 0.
pub(crate) fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

impl PartialDecomposition<'_> {
    /// Rows counted as master: master constraints plus open constraints.
    pub(crate) fn master_rows(&self) -> usize {
        self.n_master_conss() + self.n_open_conss()
    }

    /// Linking variables plus open variables.
    pub(crate) fn linking_cols(&self) -> usize {
        self.n_linking_vars() + self.n_open_vars()
    }

    /// Master rows times all columns plus border columns times the other
    /// rows.
    pub(crate) fn border_area(&self) -> f64 {
        let master_rows = self.master_rows() as f64;
        let border_cols =
            (self.linking_cols() + self.n_master_vars() + self.n_total_stairlinking_vars()) as f64;
        master_rows * self.n_vars() as f64 + border_cols * (self.n_conss() as f64 - master_rows)
    }

    /// Sum over blocks of rows times own columns. Stairlinking columns
    /// belong to the border.
    pub(crate) fn block_area(&self) -> f64 {
        (0..self.n_blocks)
            .map(|b| self.n_conss_for_block(b) as f64 * self.n_vars_for_block(b) as f64)
            .sum()
    }

    pub(crate) fn total_area(&self) -> f64 {
        self.n_conss() as f64 * self.n_vars() as f64
    }

    pub(crate) fn calc_nonzero_counts(&self) -> NonzeroCounts {
        let blocks = (0..self.n_blocks)
            .map(|block| {
                self.conss_for_block(block)
                    .iter()
                    .map(|&cons| {
                        self.space
                            .vars_for_cons(cons)
                            .iter()
                            .filter(|&&var| match self.var_slot[var] {
                                VarSlot::Block(b) => b == block,
                                VarSlot::Stairlinking(first) => {
                                    first == block || first + 1 == block
                                }
                                _ => false,
                            })
                            .count()
                    })
                    .sum()
            })
            .collect();
        let master = self
            .master_conss
            .iter()
            .map(|&cons| self.space.n_vars_for_cons(cons))
            .sum();
        NonzeroCounts { blocks, master }
    }

    fn refresh_nonzero_counts(&mut self) -> &NonzeroCounts {
        let generation = self.generation;
        let counts = match self.caches.nonzeros.get(generation) {
            Some(counts) => counts.clone(),
            None => self.calc_nonzero_counts(),
        };
        self.caches.nonzeros.set(generation, counts)
    }

    /// Coefficients in the rows of `block` on its own columns. Cached.
    pub fn n_coeffs_for_block(&mut self, block: usize) -> usize {
        self.refresh_nonzero_counts()
            .blocks
            .get(block)
            .copied()
            .unwrap_or(0)
    }

    /// Coefficients in the master rows. Cached.
    pub fn n_coeffs_for_master(&mut self) -> usize {
        self.refresh_nonzero_counts().master
    }

    /// Computes a score without touching the cache.
    ///
    /// The aggregated score uses the cached aggregation information if it
    /// is current and otherwise computes it with default limits.
    pub fn calc_score(&self, score_type: ScoreType) -> f64 {
        match score_type {
            ScoreType::Classic => self.calc_classic_score(),
            ScoreType::MaxWhite => self.calc_max_white_score(),
            ScoreType::MaxForeseeingWhite => self.calc_max_foreseeing_white_score(),
            ScoreType::MaxForeseeingWhiteAggregated => {
                match self.caches.aggregation.get(self.generation) {
                    Some(info) => self.calc_max_foreseeing_white_agg_score(info),
                    None => {
                        let info = self.compute_aggregation_information(
                            &Default::default(),
                            None,
                        );
                        self.calc_max_foreseeing_white_agg_score(&info)
                    }
                }
            }
            ScoreType::Benders => self.calc_benders_score(),
            ScoreType::SetPartForeseeingWhite => self.calc_setpart_foreseeing_white_score(),
        }
    }

    /// Returns the score of the given type, computing it on first use after
    /// a mutation.
    pub fn score(&mut self, score_type: ScoreType) -> f64 {
        let generation = self.generation;
        let slot = score_type.index();
        if let Some(&value) = self.caches.scores[slot].get(generation) {
            return value;
        }
        if score_type == ScoreType::MaxForeseeingWhiteAggregated
            && !self.caches.aggregation.is_fresh(generation)
        {
            self.calc_aggregation_information(&Default::default(), None);
        }
        let value = self.calc_score(score_type);
        *self.caches.scores[slot].set(generation, value)
    }

    /// Score of the type selected in the scoring configuration.
    pub fn selected_score(&mut self) -> f64 {
        self.score(self.scoring.score_type)
    }
}
