//! The partial decomposition and its assignment state.
//!
//! A [`PartialDecomposition`] classifies every constraint of an index space
//! as open, master or block constraint and every variable as open, master,
//! block, linking or stairlinking variable. Detectors start from an all-open
//! decomposition and move indices out of the open lists, either through the
//! two-phase booking protocol (`book_as_*` then [`flush_booked`]) or through
//! direct `set_*_to_*` calls paired with `delete_open_*`.
//!
//! [`flush_booked`]: PartialDecomposition::flush_booked

mod assign;
mod booking;
mod consistency;

#[cfg(test)]
mod tests;

use std::fmt;

use blockforge_config::ScoringConfig;
use blockforge_core::{IndexSpace, SpaceKind};

use crate::error::{DecompError, Result};
use crate::identity::AggregationInfo;
use crate::lineage::Lineage;
use crate::memo::Memo;
use crate::score::NonzeroCounts;

pub(crate) use booking::Bookings;

/// Where a constraint currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsAssignment {
    Open,
    Master,
    Block(usize),
}

/// Where a variable currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarAssignment {
    Open,
    Master,
    Block(usize),
    Linking,
    /// Stairlinking between the given block and the next one.
    Stairlinking(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConsSlot {
    Unassigned,
    Master,
    Block(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VarSlot {
    Unassigned,
    Master,
    Block(usize),
    Linking,
    Stairlinking(usize),
}

/// Derived values, each tagged with the generation it was computed for.
#[derive(Debug, Clone, Default)]
pub(crate) struct Caches {
    pub(crate) hash: Memo<u64>,
    pub(crate) scores: [Memo<f64>; 6],
    pub(crate) nonzeros: Memo<NonzeroCounts>,
    pub(crate) aggregation: Memo<AggregationInfo>,
    /// Set once brute force gave up; survives later mutations.
    pub(crate) agg_too_expensive: bool,
}

/// One candidate decomposition of a constraint matrix, complete or partial.
///
/// Holds a non-owning reference to the index space it classifies; whoever
/// drives detection owns both. Cloning is a deep copy of the assignment
/// state, so parent and child can be refined independently afterwards.
///
/// # Example
///
/// ```
/// use blockforge_core::ConstraintMatrix;
/// use blockforge_decomp::PartialDecomposition;
///
/// let matrix = ConstraintMatrix::from_pattern(4, &[&[0, 1], &[1], &[2, 3], &[3]]).unwrap();
/// let mut decomp = PartialDecomposition::new(0, &matrix);
/// decomp.complete_by_connected().unwrap();
///
/// assert!(decomp.is_complete());
/// assert_eq!(decomp.n_blocks(), 2);
/// assert_eq!(decomp.n_master_conss(), 0);
/// ```
#[derive(Clone)]
pub struct PartialDecomposition<'a> {
    pub(crate) id: usize,
    pub(crate) space: &'a dyn IndexSpace,
    pub(crate) scoring: ScoringConfig,
    pub(crate) n_blocks: usize,

    pub(crate) open_conss: Vec<usize>,
    pub(crate) open_vars: Vec<usize>,
    pub(crate) master_conss: Vec<usize>,
    pub(crate) master_vars: Vec<usize>,
    pub(crate) conss_for_blocks: Vec<Vec<usize>>,
    pub(crate) vars_for_blocks: Vec<Vec<usize>>,
    pub(crate) linking_vars: Vec<usize>,
    pub(crate) stairlinking_vars: Vec<Vec<usize>>,

    pub(crate) cons_open: Vec<bool>,
    pub(crate) var_open: Vec<bool>,
    pub(crate) cons_slot: Vec<ConsSlot>,
    pub(crate) var_slot: Vec<VarSlot>,

    pub(crate) booked: Bookings,
    pub(crate) sorted: bool,
    pub(crate) generation: u64,
    pub(crate) caches: Caches,
    pub(crate) lineage: Lineage,
}

impl<'a> PartialDecomposition<'a> {
    /// Creates a decomposition with zero blocks and every index open.
    pub fn new(id: usize, space: &'a dyn IndexSpace) -> Self {
        let n_conss = space.n_conss();
        let n_vars = space.n_vars();
        Self {
            id,
            space,
            scoring: ScoringConfig::default(),
            n_blocks: 0,
            open_conss: (0..n_conss).collect(),
            open_vars: (0..n_vars).collect(),
            master_conss: Vec::new(),
            master_vars: Vec::new(),
            conss_for_blocks: Vec::new(),
            vars_for_blocks: Vec::new(),
            linking_vars: Vec::new(),
            stairlinking_vars: Vec::new(),
            cons_open: vec![true; n_conss],
            var_open: vec![true; n_vars],
            cons_slot: vec![ConsSlot::Unassigned; n_conss],
            var_slot: vec![VarSlot::Unassigned; n_vars],
            booked: Bookings::default(),
            sorted: true,
            generation: 0,
            caches: Caches::default(),
            lineage: Lineage::default(),
        }
    }

    /// Replaces the score weights. Cached scores are invalidated.
    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self.touch();
        self
    }

    /// Copies this decomposition under a new id and records `self` as its
    /// most recent ancestor.
    pub fn derive(&self, id: usize) -> Self {
        let mut child = self.clone();
        child.id = id;
        child.lineage.add_ancestor_id(self.id);
        child
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn space(&self) -> &'a dyn IndexSpace {
        self.space
    }

    /// Whether the underlying index space is the original or presolved problem.
    pub fn space_kind(&self) -> SpaceKind {
        self.space.kind()
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    pub fn n_blocks(&self) -> usize {
        self.n_blocks
    }

    pub fn n_conss(&self) -> usize {
        self.cons_slot.len()
    }

    pub fn n_vars(&self) -> usize {
        self.var_slot.len()
    }

    /// Counter bumped by every structural mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether all index vectors are currently sorted ascending.
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn open_conss(&self) -> &[usize] {
        &self.open_conss
    }

    pub fn open_vars(&self) -> &[usize] {
        &self.open_vars
    }

    pub fn master_conss(&self) -> &[usize] {
        &self.master_conss
    }

    pub fn master_vars(&self) -> &[usize] {
        &self.master_vars
    }

    pub fn linking_vars(&self) -> &[usize] {
        &self.linking_vars
    }

    /// Constraints of `block`; empty for unknown blocks.
    pub fn conss_for_block(&self, block: usize) -> &[usize] {
        self.conss_for_blocks.get(block).map_or(&[], Vec::as_slice)
    }

    /// Variables of `block`; empty for unknown blocks.
    pub fn vars_for_block(&self, block: usize) -> &[usize] {
        self.vars_for_blocks.get(block).map_or(&[], Vec::as_slice)
    }

    /// Stairlinking variables between `block` and `block + 1`.
    pub fn stairlinking_vars(&self, block: usize) -> &[usize] {
        self.stairlinking_vars.get(block).map_or(&[], Vec::as_slice)
    }

    pub fn n_open_conss(&self) -> usize {
        self.open_conss.len()
    }

    pub fn n_open_vars(&self) -> usize {
        self.open_vars.len()
    }

    pub fn n_master_conss(&self) -> usize {
        self.master_conss.len()
    }

    pub fn n_master_vars(&self) -> usize {
        self.master_vars.len()
    }

    pub fn n_linking_vars(&self) -> usize {
        self.linking_vars.len()
    }

    pub fn n_conss_for_block(&self, block: usize) -> usize {
        self.conss_for_block(block).len()
    }

    pub fn n_vars_for_block(&self, block: usize) -> usize {
        self.vars_for_block(block).len()
    }

    pub fn n_stairlinking_vars(&self, block: usize) -> usize {
        self.stairlinking_vars(block).len()
    }

    /// Stairlinking variables over all block pairs.
    pub fn n_total_stairlinking_vars(&self) -> usize {
        self.stairlinking_vars.iter().map(Vec::len).sum()
    }

    pub fn is_cons_open(&self, cons: usize) -> bool {
        self.cons_open.get(cons).copied().unwrap_or(false)
    }

    pub fn is_cons_master(&self, cons: usize) -> bool {
        self.cons_slot.get(cons) == Some(&ConsSlot::Master)
    }

    pub fn is_cons_block_cons_of(&self, cons: usize, block: usize) -> bool {
        self.cons_slot.get(cons) == Some(&ConsSlot::Block(block))
    }

    /// Block of `cons`, if it is a block constraint.
    pub fn block_of_cons(&self, cons: usize) -> Option<usize> {
        match self.cons_slot.get(cons) {
            Some(ConsSlot::Block(block)) => Some(*block),
            _ => None,
        }
    }

    pub fn is_var_open(&self, var: usize) -> bool {
        self.var_open.get(var).copied().unwrap_or(false)
    }

    pub fn is_var_master(&self, var: usize) -> bool {
        self.var_slot.get(var) == Some(&VarSlot::Master)
    }

    pub fn is_var_linking(&self, var: usize) -> bool {
        self.var_slot.get(var) == Some(&VarSlot::Linking)
    }

    pub fn is_var_block_var_of(&self, var: usize, block: usize) -> bool {
        self.var_slot.get(var) == Some(&VarSlot::Block(block))
    }

    /// Block of `var`, if it is a block variable.
    pub fn block_of_var(&self, var: usize) -> Option<usize> {
        match self.var_slot.get(var) {
            Some(VarSlot::Block(block)) => Some(*block),
            _ => None,
        }
    }

    pub fn is_var_stairlinking(&self, var: usize) -> bool {
        matches!(self.var_slot.get(var), Some(VarSlot::Stairlinking(_)))
    }

    /// True if `var` is stairlinking between `block - 1` and `block` or
    /// between `block` and `block + 1`.
    pub fn is_var_stairlinking_of(&self, var: usize, block: usize) -> bool {
        match self.var_slot.get(var) {
            Some(VarSlot::Stairlinking(first)) => *first == block || *first + 1 == block,
            _ => false,
        }
    }

    /// Current bucket of `cons`.
    ///
    /// `None` if the index is out of range or sits between a
    /// `delete_open_cons` and the matching `set_cons_to_*`.
    pub fn cons_assignment(&self, cons: usize) -> Option<ConsAssignment> {
        if self.is_cons_open(cons) {
            return Some(ConsAssignment::Open);
        }
        match self.cons_slot.get(cons)? {
            ConsSlot::Unassigned => None,
            ConsSlot::Master => Some(ConsAssignment::Master),
            ConsSlot::Block(block) => Some(ConsAssignment::Block(*block)),
        }
    }

    /// Current bucket of `var`; see [`cons_assignment`](Self::cons_assignment).
    pub fn var_assignment(&self, var: usize) -> Option<VarAssignment> {
        if self.is_var_open(var) {
            return Some(VarAssignment::Open);
        }
        match self.var_slot.get(var)? {
            VarSlot::Unassigned => None,
            VarSlot::Master => Some(VarAssignment::Master),
            VarSlot::Block(block) => Some(VarAssignment::Block(*block)),
            VarSlot::Linking => Some(VarAssignment::Linking),
            VarSlot::Stairlinking(first) => Some(VarAssignment::Stairlinking(*first)),
        }
    }

    pub fn lineage(&self) -> &Lineage {
        &self.lineage
    }

    pub fn lineage_mut(&mut self) -> &mut Lineage {
        &mut self.lineage
    }

    /// Marks every cached value stale.
    pub(crate) fn touch(&mut self) {
        self.generation += 1;
    }

    pub(crate) fn check_cons_index(&self, cons: usize) -> Result<()> {
        if cons < self.n_conss() {
            Ok(())
        } else {
            Err(DecompError::IndexOutOfRange {
                what: "constraint",
                index: cons,
                len: self.n_conss(),
            })
        }
    }

    pub(crate) fn check_var_index(&self, var: usize) -> Result<()> {
        if var < self.n_vars() {
            Ok(())
        } else {
            Err(DecompError::IndexOutOfRange {
                what: "variable",
                index: var,
                len: self.n_vars(),
            })
        }
    }

    pub(crate) fn check_block(&self, block: usize) -> Result<()> {
        if block < self.n_blocks {
            Ok(())
        } else {
            Err(DecompError::BlockOutOfRange {
                block,
                n_blocks: self.n_blocks,
            })
        }
    }
}

impl fmt::Debug for PartialDecomposition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialDecomposition")
            .field("id", &self.id)
            .field("space", &self.space.kind())
            .field("n_blocks", &self.n_blocks)
            .field("open_conss", &self.open_conss.len())
            .field("open_vars", &self.open_vars.len())
            .field("master_conss", &self.master_conss.len())
            .field("master_vars", &self.master_vars.len())
            .field("linking_vars", &self.linking_vars.len())
            .field("generation", &self.generation)
            .finish()
    }
}

impl fmt::Display for PartialDecomposition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "decomposition {} ({:?}, {} blocks, chain '{}')",
            self.id,
            self.space.kind(),
            self.n_blocks,
            self.lineage.detector_chain_string()
        )?;
        for block in 0..self.n_blocks {
            writeln!(
                f,
                "  block {block}: {} conss, {} vars, {} stairlinking",
                self.n_conss_for_block(block),
                self.n_vars_for_block(block),
                self.n_stairlinking_vars(block)
            )?;
        }
        writeln!(
            f,
            "  master: {} conss, {} vars; linking: {} vars",
            self.master_conss.len(),
            self.master_vars.len(),
            self.linking_vars.len()
        )?;
        write!(
            f,
            "  open: {} conss, {} vars",
            self.open_conss.len(),
            self.open_vars.len()
        )
    }
}
