//! Proptest strategies for random constraint patterns.

use proptest::prelude::*;

/// Random sparsity patterns: `(n_vars, rows)` with 1 to 7 variables and 1 to
/// 9 rows of at most 3 distinct, sorted variable indices.
///
/// Feed the result to [`pattern`](crate::pattern).
pub fn pattern_strategy() -> impl Strategy<Value = (usize, Vec<Vec<usize>>)> {
    (1..8usize).prop_flat_map(|n_vars| {
        let row = prop::collection::btree_set(0..n_vars, 0..4)
            .prop_map(|set| set.into_iter().collect::<Vec<_>>());
        (Just(n_vars), prop::collection::vec(row, 1..10))
    })
}
