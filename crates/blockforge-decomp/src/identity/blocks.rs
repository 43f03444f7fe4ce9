//! Deciding whether two blocks describe the same subproblem.

use std::cmp::Ordering;

use blockforge_core::VarType;

use crate::error::Result;
use crate::partial::{ConsSlot, PartialDecomposition};

/// Outcome of an identical-block check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Identical,
    NotIdentical,
    /// The check could neither confirm nor refute identity.
    Undecided,
    /// The search budget ran out.
    TooExpensive,
}

/// External graph-automorphism backend for identical-block detection.
pub trait IsomorphismOracle: Send + Sync {
    /// `Some(true)` if a bijection between the blocks' constraints and
    /// variables preserves every coefficient, bound, objective value and
    /// master coefficient; `Some(false)` if none exists; `None` if the
    /// oracle cannot tell.
    fn blocks_identical(
        &self,
        decomp: &PartialDecomposition<'_>,
        block1: usize,
        block2: usize,
    ) -> Option<bool>;
}

/// Everything a variable mapping must preserve, independent of the mapping.
#[derive(Debug, Clone, PartialEq)]
struct VarSignature {
    var_type: VarType,
    bounds: (u64, u64),
    objective: u64,
    /// Sorted coefficients of the variable inside its block.
    block_coefs: Vec<u64>,
    /// Sorted (master constraint, coefficient) pairs.
    master_coefs: Vec<(usize, u64)>,
}

fn cmp_f64(a: &f64, b: &f64) -> Ordering {
    a.total_cmp(b)
}

/// Constraint kind name and (local variable, coefficient bits) entries.
type Row = (&'static str, Vec<(usize, u64)>);

/// A block's constraints and variables with local numbering.
struct BlockView {
    vars: Vec<usize>,
    signatures: Vec<VarSignature>,
    rows: Vec<Row>,
}

impl PartialDecomposition<'_> {
    fn block_view(&self, block: usize) -> BlockView {
        let mut conss = self.conss_for_block(block).to_vec();
        conss.sort_unstable();
        let mut vars = self.vars_for_block(block).to_vec();
        vars.sort_unstable();
        let local = |var: usize| vars.binary_search(&var).ok();

        let mut block_coefs = vec![Vec::new(); vars.len()];
        let mut rows = Vec::with_capacity(conss.len());
        for &cons in &conss {
            let mut row = Vec::new();
            let space_vars = self.space.vars_for_cons(cons);
            let vals = self.space.vals_for_cons(cons);
            for (&var, &val) in space_vars.iter().zip(vals) {
                if let Some(pos) = local(var) {
                    row.push((pos, val.to_bits()));
                    block_coefs[pos].push(val);
                }
            }
            rows.push((self.space.cons_kind(cons).name(), row));
        }

        let signatures = vars
            .iter()
            .zip(block_coefs)
            .map(|(&var, mut coefs)| {
                coefs.sort_by(cmp_f64);
                let mut master_coefs: Vec<(usize, u64)> = self
                    .space
                    .conss_for_var(var)
                    .iter()
                    .filter(|&&cons| self.cons_slot[cons] == ConsSlot::Master)
                    .map(|&cons| (cons, self.space.coefficient(cons, var).to_bits()))
                    .collect();
                master_coefs.sort_unstable();
                let (lb, ub) = self.space.var_bounds(var);
                VarSignature {
                    var_type: self.space.var_type(var),
                    bounds: (lb.to_bits(), ub.to_bits()),
                    objective: self.space.objective(var).to_bits(),
                    block_coefs: coefs.into_iter().map(f64::to_bits).collect(),
                    master_coefs,
                }
            })
            .collect();

        BlockView {
            vars,
            signatures,
            rows,
        }
    }

    /// Refutes identity by comparing sizes, constraint kinds and variable
    /// data; never confirms it.
    pub fn check_identical_blocks_trivial(
        &self,
        block1: usize,
        block2: usize,
    ) -> Result<Identity> {
        self.check_block(block1)?;
        self.check_block(block2)?;
        if block1 == block2 {
            return Ok(Identity::Identical);
        }
        if self.n_conss_for_block(block1) != self.n_conss_for_block(block2)
            || self.n_vars_for_block(block1) != self.n_vars_for_block(block2)
            || self.n_stairlinking_touching(block1) != self.n_stairlinking_touching(block2)
        {
            return Ok(Identity::NotIdentical);
        }
        let view1 = self.block_view(block1);
        let view2 = self.block_view(block2);
        Ok(if same_invariants(&view1, &view2) {
            Identity::Undecided
        } else {
            Identity::NotIdentical
        })
    }

    /// Tries the positional mapping first, then searches variable
    /// bijections depth-first, visiting at most `node_limit` nodes.
    pub fn check_identical_blocks_brute(
        &self,
        block1: usize,
        block2: usize,
        node_limit: usize,
    ) -> Result<Identity> {
        match self.check_identical_blocks_trivial(block1, block2)? {
            Identity::Undecided => {}
            decided => return Ok(decided),
        }
        let view1 = self.block_view(block1);
        let view2 = self.block_view(block2);

        let positional: Vec<usize> = (0..view1.vars.len()).collect();
        if mapping_preserves(&view1, &view2, &positional) {
            return Ok(Identity::Identical);
        }

        let mut search = BijectionSearch {
            view1: &view1,
            view2: &view2,
            mapping: vec![usize::MAX; view1.vars.len()],
            used: vec![false; view2.vars.len()],
            nodes: 0,
            node_limit,
        };
        Ok(search.run(0))
    }

    /// Asks `oracle` after the trivial check could not refute identity.
    pub fn check_identical_blocks_oracle(
        &self,
        block1: usize,
        block2: usize,
        oracle: &dyn IsomorphismOracle,
    ) -> Result<Identity> {
        match self.check_identical_blocks_trivial(block1, block2)? {
            Identity::Undecided => {}
            decided => return Ok(decided),
        }
        Ok(match oracle.blocks_identical(self, block1, block2) {
            Some(true) => Identity::Identical,
            Some(false) => Identity::NotIdentical,
            None => Identity::Undecided,
        })
    }
}

fn same_invariants(view1: &BlockView, view2: &BlockView) -> bool {
    let kinds = |view: &BlockView| {
        let mut kinds: Vec<(&str, usize)> =
            view.rows.iter().map(|(kind, row)| (*kind, row.len())).collect();
        kinds.sort_unstable();
        kinds
    };
    if kinds(view1) != kinds(view2) {
        return false;
    }
    let mut matched = vec![false; view2.signatures.len()];
    view1.signatures.iter().all(|sig| {
        let found = view2
            .signatures
            .iter()
            .enumerate()
            .position(|(j, other)| !matched[j] && other == sig);
        match found {
            Some(j) => {
                matched[j] = true;
                true
            }
            None => false,
        }
    })
}

/// True if mapping local variable `i` of block 1 to `mapping[i]` of
/// block 2 maps the rows of block 1 onto the rows of block 2.
fn mapping_preserves(view1: &BlockView, view2: &BlockView, mapping: &[usize]) -> bool {
    let compatible = mapping
        .iter()
        .enumerate()
        .all(|(i, &j)| view1.signatures[i] == view2.signatures[j]);
    if !compatible {
        return false;
    }
    let canonical = |rows: Vec<Row>| {
        let mut rows: Vec<_> = rows
            .into_iter()
            .map(|(kind, mut row)| {
                row.sort_unstable();
                (kind, row)
            })
            .collect();
        rows.sort_unstable();
        rows
    };
    let mapped: Vec<Row> = view1
        .rows
        .iter()
        .map(|(kind, row)| (*kind, row.iter().map(|&(v, c)| (mapping[v], c)).collect()))
        .collect();
    canonical(mapped) == canonical(view2.rows.clone())
}

struct BijectionSearch<'v> {
    view1: &'v BlockView,
    view2: &'v BlockView,
    mapping: Vec<usize>,
    used: Vec<bool>,
    nodes: usize,
    node_limit: usize,
}

impl BijectionSearch<'_> {
    fn run(&mut self, depth: usize) -> Identity {
        if depth == self.mapping.len() {
            return if mapping_preserves(self.view1, self.view2, &self.mapping) {
                Identity::Identical
            } else {
                Identity::NotIdentical
            };
        }
        for candidate in 0..self.view2.vars.len() {
            if self.used[candidate]
                || self.view1.signatures[depth] != self.view2.signatures[candidate]
            {
                continue;
            }
            self.nodes += 1;
            if self.nodes > self.node_limit {
                return Identity::TooExpensive;
            }
            self.mapping[depth] = candidate;
            self.used[candidate] = true;
            let outcome = self.run(depth + 1);
            self.used[candidate] = false;
            match outcome {
                Identity::NotIdentical => continue,
                found => return found,
            }
        }
        Identity::NotIdentical
    }
}
