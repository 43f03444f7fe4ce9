use super::{clamp_unit, ratio};
use crate::identity::AggregationInfo;
use crate::partial::PartialDecomposition;

impl PartialDecomposition<'_> {
    /// Share of the matrix outside border and blocks.
    pub(crate) fn calc_max_white_score(&self) -> f64 {
        let total = self.total_area();
        if total == 0.0 {
            return 0.0;
        }
        clamp_unit(1.0 - (self.border_area() + self.block_area()) / total)
    }

    pub(crate) fn calc_max_foreseeing_white_score(&self) -> f64 {
        let all: Vec<bool> = vec![true; self.n_blocks];
        self.foreseeing_white(&all)
    }

    /// Foreseeing white where each class of identical blocks contributes
    /// the area of its representative only.
    pub(crate) fn calc_max_foreseeing_white_agg_score(&self, info: &AggregationInfo) -> f64 {
        let mut active = vec![false; self.n_blocks];
        for rep in 0..info.n_reps() {
            if let Some(&block) = info.blocks_for_rep(rep).first() {
                if block < self.n_blocks {
                    active[block] = true;
                }
            }
        }
        self.foreseeing_white(&active)
    }

    /// White area of the matrix obtained by copying every linking,
    /// stairlinking and open variable into each block it hits, with one
    /// consistency row per copy. Only `active` blocks count towards the
    /// covered area; the matrix dimensions always include every block.
    fn foreseeing_white(&self, active: &[bool]) -> f64 {
        let mut block_width: Vec<usize> = (0..self.n_blocks)
            .map(|b| self.n_vars_for_block(b))
            .collect();

        let mut copies = 0usize;
        let mut coupling_cols = 0usize;
        let stairlinking = self.stairlinking_vars.iter().flatten();
        for &var in self.linking_vars.iter().chain(&self.open_vars).chain(stairlinking) {
            let blocks = self.blocks_hit_by_var(var);
            for &block in &blocks {
                block_width[block] += 1;
            }
            copies += blocks.len();
            coupling_cols += blocks.len().max(1);
        }

        let block_rows: usize = (0..self.n_blocks).map(|b| self.n_conss_for_block(b)).sum();
        let block_cols: usize = (0..self.n_blocks).map(|b| self.n_vars_for_block(b)).sum();

        let master_rows = self.master_rows() + copies;
        let height = master_rows + block_rows;
        let width = self.n_master_vars() + block_cols + coupling_cols;
        let total = height as f64 * width as f64;
        if total == 0.0 {
            return 0.0;
        }

        let master_area = master_rows as f64 * width as f64;
        let block_area: f64 = (0..self.n_blocks)
            .filter(|&b| active[b])
            .map(|b| self.n_conss_for_block(b) as f64 * block_width[b] as f64)
            .sum();
        clamp_unit(1.0 - ratio(master_area + block_area, total))
    }
}
