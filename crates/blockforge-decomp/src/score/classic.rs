use super::{clamp_unit, ratio};
use crate::partial::PartialDecomposition;

impl PartialDecomposition<'_> {
    /// Stairlinking variables touching `block` from either side.
    pub(crate) fn n_stairlinking_touching(&self, block: usize) -> usize {
        let below = if block > 0 {
            self.n_stairlinking_vars(block - 1)
        } else {
            0
        };
        self.n_stairlinking_vars(block) + below
    }

    /// Number of linking or open variables hitting each block's rows.
    pub(crate) fn linking_hits_per_block(&self) -> Vec<usize> {
        let mut hits = vec![0; self.n_blocks];
        for &var in self.linking_vars.iter().chain(&self.open_vars) {
            for block in self.blocks_hit_by_var(var) {
                hits[block] += 1;
            }
        }
        hits
    }

    /// Weighted sum of border size, linking spread and block density.
    pub(crate) fn calc_classic_score(&self) -> f64 {
        let total = self.total_area();
        if total == 0.0 {
            return 0.0;
        }
        let weights = &self.scoring;

        let border_score = 1.0 - self.border_area() / total;

        let coupling_vars = (self.linking_cols()
            + self.n_master_vars()
            + self.n_total_stairlinking_vars()) as f64;
        let hits = self.linking_hits_per_block();
        let spread: f64 = (0..self.n_blocks)
            .map(|b| ratio((hits[b] + self.n_stairlinking_touching(b)) as f64, coupling_vars))
            .product();
        let linking_score = 1.0 - (0.5 + 0.5 * spread);

        let counts = self.calc_nonzero_counts();
        let density_score = (0..self.n_blocks)
            .filter_map(|b| {
                let area = self.n_conss_for_block(b) as f64
                    * (self.n_vars_for_block(b) + self.n_stairlinking_touching(b)) as f64;
                (area > 0.0).then(|| counts.blocks[b] as f64 / area)
            })
            .fold(None, |min: Option<f64>, d| Some(min.map_or(d, |m| m.min(d))))
            .unwrap_or(0.0);

        clamp_unit(
            weights.border_area_weight * border_score
                + weights.linking_weight * linking_score
                + weights.density_weight * density_score.min(1.0),
        )
    }
}
