//! Sparse constraint matrix backed by `sprs`.

use std::collections::HashMap;

use sprs::{CsMat, TriMat};

use super::{ConsKind, IndexSpace, SpaceKind, VarType};
use crate::error::{CoreError, Result};

#[derive(Debug, Clone)]
struct PendingCons {
    name: String,
    entries: Vec<(usize, f64)>,
    lhs: f64,
    rhs: f64,
}

/// Incremental builder for a [`ConstraintMatrix`].
///
/// # Example
///
/// ```
/// use blockforge_core::{IndexSpace, MatrixBuilder, VarType};
///
/// let mut builder = MatrixBuilder::new();
/// let x = builder.add_var("x", VarType::Binary, 0.0, 1.0, 1.0).unwrap();
/// let y = builder.add_var("y", VarType::Binary, 0.0, 1.0, 1.0).unwrap();
/// builder.add_cons("c", &[(x, 1.0), (y, 1.0)], 1.0, 1.0).unwrap();
///
/// let matrix = builder.build();
/// assert_eq!(matrix.n_conss(), 1);
/// assert_eq!(matrix.vars_for_cons(0), &[0, 1]);
/// ```
#[derive(Debug, Default)]
pub struct MatrixBuilder {
    kind: SpaceKind,
    var_names: Vec<String>,
    var_types: Vec<VarType>,
    var_bounds: Vec<(f64, f64)>,
    objective: Vec<f64>,
    var_lookup: HashMap<String, usize>,
    conss: Vec<PendingCons>,
    cons_lookup: HashMap<String, usize>,
}

impl MatrixBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the resulting matrix as indexing the presolved problem.
    pub fn presolved(mut self) -> Self {
        self.kind = SpaceKind::Presolved;
        self
    }

    /// Adds a variable and returns its dense index.
    pub fn add_var(
        &mut self,
        name: impl Into<String>,
        var_type: VarType,
        lb: f64,
        ub: f64,
        obj: f64,
    ) -> Result<usize> {
        let name = name.into();
        if self.var_lookup.contains_key(&name) {
            return Err(CoreError::DuplicateName {
                what: "variable",
                name,
            });
        }
        let index = self.var_names.len();
        self.var_lookup.insert(name.clone(), index);
        self.var_names.push(name);
        self.var_types.push(var_type);
        self.var_bounds.push((lb, ub));
        self.objective.push(obj);
        Ok(index)
    }

    /// Adds a binary variable with zero objective.
    pub fn add_binary(&mut self, name: impl Into<String>) -> Result<usize> {
        self.add_var(name, VarType::Binary, 0.0, 1.0, 0.0)
    }

    /// Looks up a variable index by name.
    pub fn var_index(&self, name: &str) -> Option<usize> {
        self.var_lookup.get(name).copied()
    }

    /// Adds the row `lhs <= sum(coef * var) <= rhs` and returns its index.
    ///
    /// Repeated variables are merged and explicit zeros dropped.
    pub fn add_cons(
        &mut self,
        name: impl Into<String>,
        entries: &[(usize, f64)],
        lhs: f64,
        rhs: f64,
    ) -> Result<usize> {
        let name = name.into();
        if self.cons_lookup.contains_key(&name) {
            return Err(CoreError::DuplicateName {
                what: "constraint",
                name,
            });
        }
        if lhs > rhs {
            return Err(CoreError::InvalidMatrix(format!(
                "constraint {name} has lhs {lhs} > rhs {rhs}"
            )));
        }
        let n_vars = self.var_names.len();
        let mut merged: Vec<(usize, f64)> = Vec::with_capacity(entries.len());
        let mut sorted = entries.to_vec();
        sorted.sort_by_key(|&(var, _)| var);
        for (var, coef) in sorted {
            if var >= n_vars {
                return Err(CoreError::IndexOutOfRange {
                    what: "variable",
                    index: var,
                    len: n_vars,
                });
            }
            match merged.last_mut() {
                Some(last) if last.0 == var => last.1 += coef,
                _ => merged.push((var, coef)),
            }
        }
        merged.retain(|&(_, coef)| coef != 0.0);

        let index = self.conss.len();
        self.cons_lookup.insert(name.clone(), index);
        self.conss.push(PendingCons {
            name,
            entries: merged,
            lhs,
            rhs,
        });
        Ok(index)
    }

    /// Freezes the builder into an immutable matrix.
    pub fn build(self) -> ConstraintMatrix {
        let n_conss = self.conss.len();
        let n_vars = self.var_names.len();

        let mut triplets = TriMat::new((n_conss, n_vars));
        let mut cons_kinds = Vec::with_capacity(n_conss);
        let mut cons_names = Vec::with_capacity(n_conss);
        for (row, cons) in self.conss.into_iter().enumerate() {
            for &(col, val) in &cons.entries {
                triplets.add_triplet(row, col, val);
            }
            cons_kinds.push(classify_cons(
                &cons.entries,
                cons.lhs,
                cons.rhs,
                &self.var_types,
            ));
            cons_names.push(cons.name);
        }

        let rows: CsMat<f64> = triplets.to_csr();
        let cols: CsMat<f64> = triplets.to_csc();
        let row_offsets = outer_offsets(&rows, n_conss);
        let col_offsets = outer_offsets(&cols, n_vars);

        ConstraintMatrix {
            kind: self.kind,
            rows,
            cols,
            row_offsets,
            col_offsets,
            cons_names,
            cons_kinds,
            var_names: self.var_names,
            var_types: self.var_types,
            var_bounds: self.var_bounds,
            objective: self.objective,
        }
    }
}

fn outer_offsets(mat: &CsMat<f64>, outer_dim: usize) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(outer_dim + 1);
    offsets.push(0);
    let mut acc = 0;
    for outer in 0..outer_dim {
        acc += mat.outer_view(outer).map_or(0, |view| view.nnz());
        offsets.push(acc);
    }
    offsets
}

fn classify_cons(entries: &[(usize, f64)], lhs: f64, rhs: f64, var_types: &[VarType]) -> ConsKind {
    if entries.is_empty() {
        return ConsKind::Linear;
    }
    let all_binary = entries
        .iter()
        .all(|&(var, _)| var_types[var] == VarType::Binary);
    if !all_binary {
        return ConsKind::Linear;
    }
    let unit = entries.iter().all(|&(_, coef)| coef == 1.0);
    if unit {
        if lhs == 1.0 && rhs == 1.0 {
            return ConsKind::SetPartitioning;
        }
        if rhs == 1.0 && lhs <= 0.0 {
            return ConsKind::SetPacking;
        }
        if lhs == 1.0 && rhs >= entries.len() as f64 {
            return ConsKind::SetCovering;
        }
        if lhs == rhs && lhs >= 2.0 && lhs.fract() == 0.0 {
            return ConsKind::Cardinality;
        }
    }
    let integral_nonneg = entries
        .iter()
        .all(|&(_, coef)| coef >= 0.0 && coef.fract() == 0.0);
    if integral_nonneg && rhs.is_finite() && lhs <= 0.0 {
        return ConsKind::Knapsack;
    }
    ConsKind::Linear
}

/// Immutable sparse matrix with row and column access.
///
/// Stores the matrix once in compressed rows and once in compressed columns
/// so both adjacency directions are slice lookups.
#[derive(Debug, Clone)]
pub struct ConstraintMatrix {
    kind: SpaceKind,
    rows: CsMat<f64>,
    cols: CsMat<f64>,
    row_offsets: Vec<usize>,
    col_offsets: Vec<usize>,
    cons_names: Vec<String>,
    cons_kinds: Vec<ConsKind>,
    var_names: Vec<String>,
    var_types: Vec<VarType>,
    var_bounds: Vec<(f64, f64)>,
    objective: Vec<f64>,
}

impl ConstraintMatrix {
    /// Builds a pure 0/1 pattern: binary variables `x0..`, one `<= 1` row per
    /// entry of `rows`, all coefficients one.
    ///
    /// Mostly useful for tests and small hand-made instances.
    pub fn from_pattern(n_vars: usize, rows: &[&[usize]]) -> Result<Self> {
        let mut builder = MatrixBuilder::new();
        for var in 0..n_vars {
            builder.add_binary(format!("x{var}"))?;
        }
        for (index, row) in rows.iter().enumerate() {
            let entries: Vec<(usize, f64)> = row.iter().map(|&var| (var, 1.0)).collect();
            builder.add_cons(format!("c{index}"), &entries, f64::NEG_INFINITY, 1.0)?;
        }
        Ok(builder.build())
    }

    /// Nonzero pattern in compressed-row form.
    pub fn csr(&self) -> &CsMat<f64> {
        &self.rows
    }

    /// Nonzero pattern in compressed-column form.
    pub fn csc(&self) -> &CsMat<f64> {
        &self.cols
    }

    pub fn cons_index(&self, name: &str) -> Option<usize> {
        self.cons_names.iter().position(|n| n == name)
    }

    pub fn var_index(&self, name: &str) -> Option<usize> {
        self.var_names.iter().position(|n| n == name)
    }
}

impl IndexSpace for ConstraintMatrix {
    fn kind(&self) -> SpaceKind {
        self.kind
    }

    fn n_conss(&self) -> usize {
        self.cons_names.len()
    }

    fn n_vars(&self) -> usize {
        self.var_names.len()
    }

    fn n_nonzeros(&self) -> usize {
        self.rows.nnz()
    }

    fn vars_for_cons(&self, cons: usize) -> &[usize] {
        &self.rows.indices()[self.row_offsets[cons]..self.row_offsets[cons + 1]]
    }

    fn vals_for_cons(&self, cons: usize) -> &[f64] {
        &self.rows.data()[self.row_offsets[cons]..self.row_offsets[cons + 1]]
    }

    fn conss_for_var(&self, var: usize) -> &[usize] {
        &self.cols.indices()[self.col_offsets[var]..self.col_offsets[var + 1]]
    }

    fn cons_name(&self, cons: usize) -> &str {
        &self.cons_names[cons]
    }

    fn var_name(&self, var: usize) -> &str {
        &self.var_names[var]
    }

    fn cons_kind(&self, cons: usize) -> ConsKind {
        self.cons_kinds[cons]
    }

    fn var_type(&self, var: usize) -> VarType {
        self.var_types[var]
    }

    fn objective(&self, var: usize) -> f64 {
        self.objective[var]
    }

    fn var_bounds(&self, var: usize) -> (f64, f64) {
        self.var_bounds[var]
    }
}
