//! Constraint matrices with known block structure.
//!
//! Fixtures panic on construction errors; their inputs are fixed.

use blockforge_core::{ConstraintMatrix, MatrixBuilder, VarType};

/// 0/1 pattern matrix; see [`ConstraintMatrix::from_pattern`].
pub fn pattern(n_vars: usize, rows: &[&[usize]]) -> ConstraintMatrix {
    ConstraintMatrix::from_pattern(n_vars, rows).expect("fixture pattern is valid")
}

/// Two independent 2x2 blocks: `c0 = {x0, x1}`, `c1 = {x1}`,
/// `c2 = {x2, x3}`, `c3 = {x3}`.
pub fn two_blocks() -> ConstraintMatrix {
    pattern(4, &[&[0, 1], &[1], &[2, 3], &[3]])
}

/// Two blocks `{c0, c1}` and `{c2, c3}` sharing `x0`:
/// `c0 = {x0, x1}`, `c1 = {x1}`, `c2 = {x0, x2}`, `c3 = {x2}`.
pub fn linked_pair() -> ConstraintMatrix {
    pattern(3, &[&[0, 1], &[1], &[0, 2], &[2]])
}

/// `n_blocks` blocks in a chain.
///
/// Block `k` owns `x{k}` and the rows `c{2k} = {x{k}}` and
/// `c{2k+1} = {x{k}, s{k-1}, s{k}}`, where `s{k} = x{n_blocks + k}` joins
/// blocks `k` and `k + 1`.
pub fn staircase(n_blocks: usize) -> ConstraintMatrix {
    let n_vars = n_blocks + n_blocks.saturating_sub(1);
    let mut rows: Vec<Vec<usize>> = Vec::with_capacity(2 * n_blocks);
    for k in 0..n_blocks {
        rows.push(vec![k]);
        let mut coupled = vec![k];
        if k > 0 {
            coupled.push(n_blocks + k - 1);
        }
        if k + 1 < n_blocks {
            coupled.push(n_blocks + k);
        }
        rows.push(coupled);
    }
    let rows: Vec<&[usize]> = rows.iter().map(Vec::as_slice).collect();
    pattern(n_vars, &rows)
}

/// Bin packing with `n_bins` identical bins and `n_items` items.
///
/// Variable `x_{b}_{j}` (index `b * n_items + j`) puts item `j` into bin
/// `b`. Row `cap_{b}` (index `b`) is the knapsack of bin `b` with weight
/// `j + 1` for item `j`; row `assign_{j}` (index `n_bins + j`) is the set
/// partitioning row of item `j`.
pub fn bin_packing(n_bins: usize, n_items: usize) -> ConstraintMatrix {
    let mut builder = MatrixBuilder::new();
    for b in 0..n_bins {
        for j in 0..n_items {
            builder
                .add_var(format!("x_{b}_{j}"), VarType::Binary, 0.0, 1.0, 1.0)
                .expect("fixture variable names are unique");
        }
    }
    let capacity = n_items as f64;
    for b in 0..n_bins {
        let entries: Vec<(usize, f64)> = (0..n_items)
            .map(|j| (b * n_items + j, (j + 1) as f64))
            .collect();
        builder
            .add_cons(format!("cap_{b}"), &entries, f64::NEG_INFINITY, capacity)
            .expect("fixture knapsack row is valid");
    }
    for j in 0..n_items {
        let entries: Vec<(usize, f64)> = (0..n_bins).map(|b| (b * n_items + j, 1.0)).collect();
        builder
            .add_cons(format!("assign_{j}"), &entries, 1.0, 1.0)
            .expect("fixture assignment row is valid");
    }
    builder.build()
}
