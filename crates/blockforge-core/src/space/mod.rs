//! Index spaces over the rows and columns of a mixed-integer program.
//!
//! Decompositions never look at a problem directly. They see dense
//! constraint indices `0..n_conss` and variable indices `0..n_vars`,
//! together with the nonzero pattern connecting them.

mod matrix;

#[cfg(test)]
mod tests;

use std::fmt;

pub use matrix::{ConstraintMatrix, MatrixBuilder};

/// Which variant of the problem an index space was built over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpaceKind {
    /// The problem as the user stated it.
    #[default]
    Original,
    /// The problem after presolving.
    Presolved,
}

impl SpaceKind {
    pub fn is_presolved(self) -> bool {
        matches!(self, SpaceKind::Presolved)
    }
}

/// Variable domain type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VarType {
    Binary,
    Integer,
    Continuous,
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarType::Binary => write!(f, "binary"),
            VarType::Integer => write!(f, "integer"),
            VarType::Continuous => write!(f, "continuous"),
        }
    }
}

/// Structural type of a linear constraint.
///
/// Set partitioning, packing, covering and cardinality rows reformulate
/// especially well when they end up in the master problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConsKind {
    /// `sum x = 1` over binaries with unit coefficients.
    SetPartitioning,
    /// `sum x <= 1` over binaries with unit coefficients.
    SetPacking,
    /// `sum x >= 1` over binaries with unit coefficients.
    SetCovering,
    /// `sum x = k` over binaries with unit coefficients, `k >= 2`.
    Cardinality,
    /// Nonnegative integral coefficients over binaries with a finite upper side.
    Knapsack,
    /// Anything else.
    Linear,
}

impl ConsKind {
    /// Returns true for set partitioning, packing, covering and cardinality rows.
    pub fn is_setppc_or_cardinality(self) -> bool {
        matches!(
            self,
            ConsKind::SetPartitioning
                | ConsKind::SetPacking
                | ConsKind::SetCovering
                | ConsKind::Cardinality
        )
    }

    /// Short lowercase name used as a class name by classifiers.
    pub fn name(self) -> &'static str {
        match self {
            ConsKind::SetPartitioning => "setpartitioning",
            ConsKind::SetPacking => "setpacking",
            ConsKind::SetCovering => "setcovering",
            ConsKind::Cardinality => "cardinality",
            ConsKind::Knapsack => "knapsack",
            ConsKind::Linear => "linear",
        }
    }
}

impl fmt::Display for ConsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only view of a constraint matrix through dense indices.
///
/// Implementations must be immutable once built: decompositions hold a
/// shared reference and may be refined on several threads at once.
pub trait IndexSpace: Send + Sync {
    /// Whether this space indexes the original or the presolved problem.
    fn kind(&self) -> SpaceKind;

    /// Number of constraints (rows).
    fn n_conss(&self) -> usize;

    /// Number of variables (columns).
    fn n_vars(&self) -> usize;

    /// Total number of nonzero coefficients.
    fn n_nonzeros(&self) -> usize;

    /// Variables with a nonzero coefficient in `cons`, ascending.
    fn vars_for_cons(&self, cons: usize) -> &[usize];

    /// Coefficients aligned with [`vars_for_cons`](Self::vars_for_cons).
    fn vals_for_cons(&self, cons: usize) -> &[f64];

    /// Constraints in which `var` has a nonzero coefficient, ascending.
    fn conss_for_var(&self, var: usize) -> &[usize];

    fn cons_name(&self, cons: usize) -> &str;

    fn var_name(&self, var: usize) -> &str;

    fn cons_kind(&self, cons: usize) -> ConsKind;

    fn var_type(&self, var: usize) -> VarType;

    /// Objective coefficient of `var`.
    fn objective(&self, var: usize) -> f64;

    /// Lower and upper bound of `var`.
    fn var_bounds(&self, var: usize) -> (f64, f64);

    /// Number of nonzeros in row `cons`.
    fn n_vars_for_cons(&self, cons: usize) -> usize {
        self.vars_for_cons(cons).len()
    }

    /// Number of nonzeros in column `var`.
    fn n_conss_for_var(&self, var: usize) -> usize {
        self.conss_for_var(var).len()
    }

    /// Coefficient of `var` in `cons`, zero when absent.
    fn coefficient(&self, cons: usize, var: usize) -> f64 {
        let vars = self.vars_for_cons(cons);
        match vars.binary_search(&var) {
            Ok(pos) => self.vals_for_cons(cons)[pos],
            Err(_) => 0.0,
        }
    }
}
