use super::{clamp_unit, ratio};
use crate::partial::{PartialDecomposition, VarSlot};
use crate::refine::BlockSet;

impl PartialDecomposition<'_> {
    /// Area of master rows reaching into block columns: for each block, the
    /// master or open rows hitting one of its variables times its width.
    pub(crate) fn benders_interference_area(&self) -> f64 {
        let mut rows_hitting = vec![0usize; self.n_blocks];
        for &cons in self.master_conss.iter().chain(&self.open_conss) {
            let mut seen = BlockSet::new();
            for &var in self.space.vars_for_cons(cons) {
                if let VarSlot::Block(block) = self.var_slot[var] {
                    if !self.var_open[var] && !seen.contains(&block) {
                        seen.push(block);
                        rows_hitting[block] += 1;
                    }
                }
            }
        }
        (0..self.n_blocks)
            .map(|b| rows_hitting[b] as f64 * self.n_vars_for_block(b) as f64)
            .sum()
    }

    /// Block area plus the master corner, less the penalized interference.
    pub(crate) fn calc_benders_score(&self) -> f64 {
        let total = self.total_area();
        if total == 0.0 {
            return 0.0;
        }
        let block_area: f64 = (0..self.n_blocks)
            .map(|b| self.n_conss_for_block(b) as f64 * self.n_vars_for_block(b) as f64)
            .sum();
        let corner = self.master_rows() as f64 * self.n_master_vars() as f64;
        let interference = ratio(self.benders_interference_area(), total);
        clamp_unit((block_area + corner) / total - self.scoring.benders_penalty * interference)
    }
}
