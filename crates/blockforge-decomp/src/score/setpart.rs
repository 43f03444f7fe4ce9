use super::clamp_unit;
use crate::partial::PartialDecomposition;

impl PartialDecomposition<'_> {
    /// True if the master consists only of set partitioning, packing,
    /// covering or cardinality rows and nothing links the blocks.
    pub fn has_setppc_master(&self) -> bool {
        if self.master_rows() == 0 || self.linking_cols() > 0 {
            return false;
        }
        if self.n_total_stairlinking_vars() > 0 {
            return false;
        }
        self.master_conss
            .iter()
            .chain(&self.open_conss)
            .all(|&cons| self.space.cons_kind(cons).is_setppc_or_cardinality())
    }

    /// Foreseeing white blended with a bonus for a set-partitioning master.
    pub(crate) fn calc_setpart_foreseeing_white_score(&self) -> f64 {
        let weight = self.scoring.setpart_weight;
        let bonus = if self.has_setppc_master() { 1.0 } else { 0.0 };
        clamp_unit(weight * self.calc_max_foreseeing_white_score() + (1.0 - weight) * bonus)
    }
}
