//! Refinement: moving constraints and variables out of the open lists.
//!
//! Every operation here is monotone: an index that has left the open list
//! never returns to it, except through [`delete_empty_blocks`]. Precondition
//! failures are reported before the first mutation; "nothing to do" is a
//! `false` return, never an error.
//!
//! [`delete_empty_blocks`]: crate::PartialDecomposition::delete_empty_blocks

mod connected;
mod constoblock;
mod greedy;
mod implicits;
mod postprocess;
mod stairlinking;


use smallvec::SmallVec;

use crate::error::Result;
use crate::partial::{ConsSlot, PartialDecomposition, VarSlot};

pub(crate) type BlockSet = SmallVec<[usize; 4]>;

/// What an open constraint sees through its variables.
#[derive(Debug, Default)]
pub(crate) struct ConsNeighborhood {
    pub(crate) hits_master_var: bool,
    pub(crate) hits_open_var: bool,
    /// Distinct blocks of the block variables hit, ascending.
    pub(crate) var_blocks: BlockSet,
    /// Blocks compatible with every block and stairlinking variable hit;
    /// `None` if the constraint hits no such variable.
    pub(crate) compatible: Option<BlockSet>,
}

impl ConsNeighborhood {
    /// The constraint can no longer live in any single block.
    pub(crate) fn forces_master(&self) -> bool {
        self.hits_master_var
            || self.var_blocks.len() >= 2
            || self.compatible.as_ref().is_some_and(|c| c.is_empty())
    }

    /// The unique block the constraint is compatible with, if any.
    pub(crate) fn single_block(&self) -> Option<usize> {
        match self.compatible.as_deref() {
            Some(&[block]) if !self.hits_master_var => Some(block),
            _ => None,
        }
    }
}

fn insert_sorted(set: &mut BlockSet, block: usize) {
    if let Err(pos) = set.binary_search(&block) {
        set.insert(pos, block);
    }
}

fn intersect(current: Option<BlockSet>, allowed: &[usize]) -> Option<BlockSet> {
    Some(match current {
        None => allowed.iter().copied().collect(),
        Some(set) => set.into_iter().filter(|b| allowed.contains(b)).collect(),
    })
}

impl PartialDecomposition<'_> {
    /// Distinct blocks of the block constraints `var` appears in, ascending.
    pub(crate) fn blocks_hit_by_var(&self, var: usize) -> BlockSet {
        let mut blocks = BlockSet::new();
        for &cons in self.space.conss_for_var(var) {
            if let ConsSlot::Block(block) = self.cons_slot[cons] {
                insert_sorted(&mut blocks, block);
            }
        }
        blocks
    }

    /// True if `var` appears in a constraint that is still open.
    pub(crate) fn var_hits_open_cons(&self, var: usize) -> bool {
        self.space
            .conss_for_var(var)
            .iter()
            .any(|&cons| self.cons_open[cons])
    }

    pub(crate) fn cons_neighborhood(&self, cons: usize) -> ConsNeighborhood {
        let mut hood = ConsNeighborhood::default();
        for &var in self.space.vars_for_cons(cons) {
            if self.var_open[var] {
                hood.hits_open_var = true;
                continue;
            }
            match self.var_slot[var] {
                VarSlot::Master => hood.hits_master_var = true,
                VarSlot::Block(block) => {
                    insert_sorted(&mut hood.var_blocks, block);
                    hood.compatible = intersect(hood.compatible.take(), &[block]);
                }
                VarSlot::Stairlinking(first) => {
                    hood.compatible = intersect(hood.compatible.take(), &[first, first + 1]);
                }
                VarSlot::Linking | VarSlot::Unassigned => {}
            }
        }
        hood
    }

    /// Classifies every remaining open variable from the blocks of the
    /// constraints it hits: one block makes it a block variable, two or more
    /// a linking variable, none a master variable.
    ///
    /// Only variables whose constraints are all assigned are touched.
    pub(crate) fn resolve_open_vars(&mut self) {
        let open_vars = self.open_vars.clone();
        let mut changed = false;
        for var in open_vars {
            if self.var_hits_open_cons(var) {
                continue;
            }
            let blocks = self.blocks_hit_by_var(var);
            let slot = match blocks.as_slice() {
                [] => VarSlot::Master,
                [block] => VarSlot::Block(*block),
                _ => VarSlot::Linking,
            };
            self.commit_var(var, slot);
            changed = true;
        }
        if changed {
            self.prune_open();
        }
    }

    /// True if neither constraints nor variables are open.
    pub fn is_complete(&self) -> bool {
        self.open_conss.is_empty() && self.open_vars.is_empty()
    }

    /// True if the decomposition carries no exploitable structure.
    ///
    /// That is the case if one block holds at least the trivial-block
    /// fraction of all constraints, if the master holds that fraction, if
    /// there are no blocks although everything is assigned, or if every
    /// variable is a master or linking variable.
    pub fn is_trivial(&self) -> bool {
        let n_conss = self.n_conss();
        let threshold = self.scoring.trivial_block_fraction * n_conss as f64;
        if n_conss > 0 {
            if self.n_blocks == 1 && self.n_conss_for_block(0) as f64 >= threshold {
                return true;
            }
            if self.n_master_conss() as f64 >= threshold {
                return true;
            }
        }
        if self.n_blocks == 0 && self.is_complete() {
            return true;
        }
        self.n_blocks > 0
            && self.n_vars() > 0
            && self.n_master_vars() + self.n_linking_vars() == self.n_vars()
    }

    /// True if some constraint already sits in a block.
    pub fn already_assigned_conss_to_blocks(&self) -> bool {
        self.conss_for_blocks.iter().any(|conss| !conss.is_empty())
    }

    /// Completes the decomposition: by connectivity if there are no linking
    /// variables yet, greedily otherwise.
    pub fn complete(&mut self) -> Result<()> {
        if self.linking_vars.is_empty() {
            self.complete_by_connected()
        } else {
            self.complete_greedily()
        }
    }

    /// Alternates the two hitting passes until neither moves anything, then
    /// applies the implicit rules.
    pub fn refine_to_blocks(&mut self) -> Result<()> {
        loop {
            let conss_moved = self.assign_hitting_open_conss()?;
            let vars_moved = self.assign_hitting_open_vars()?;
            if !conss_moved && !vars_moved {
                break;
            }
        }
        self.consider_implicits()
    }

    /// Applies the implicit rules, then pushes every open index that can no
    /// longer live in a single block to the border.
    pub fn refine_to_master(&mut self) -> Result<()> {
        self.consider_implicits()?;
        self.assign_open_partial_hitting_to_master()?;
        Ok(())
    }

    /// Completes the decomposition by sending every open constraint to the
    /// master, then placing the variables by the implicit rules.
    pub fn complete_conss_to_master(&mut self) -> Result<()> {
        self.flush_booked()?;
        for &cons in &self.open_conss.clone() {
            self.book_as_master_cons(cons)?;
        }
        self.consider_implicits()
    }
}
