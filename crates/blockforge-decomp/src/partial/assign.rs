//! Direct assignment, block management and relabeling.

use tracing::debug;

use super::{ConsSlot, PartialDecomposition, VarSlot};
use crate::error::{DecompError, Result};

fn remove_value(values: &mut Vec<usize>, value: usize) {
    if let Some(pos) = values.iter().position(|&v| v == value) {
        values.remove(pos);
    }
}

impl PartialDecomposition<'_> {
    /// Appends an empty block and returns its index.
    pub fn add_block(&mut self) -> usize {
        self.conss_for_blocks.push(Vec::new());
        self.vars_for_blocks.push(Vec::new());
        self.stairlinking_vars.push(Vec::new());
        self.n_blocks += 1;
        self.touch();
        self.n_blocks - 1
    }

    /// Grows the number of blocks to `n_blocks`.
    ///
    /// # Errors
    ///
    /// Shrinking is not allowed; use [`delete_empty_blocks`] instead.
    ///
    /// [`delete_empty_blocks`]: Self::delete_empty_blocks
    pub fn set_n_blocks(&mut self, n_blocks: usize) -> Result<()> {
        if n_blocks < self.n_blocks {
            return Err(DecompError::InvalidState(format!(
                "cannot reduce the number of blocks from {} to {n_blocks}",
                self.n_blocks
            )));
        }
        while self.n_blocks < n_blocks {
            self.add_block();
        }
        Ok(())
    }

    fn check_cons_unassigned(&self, cons: usize) -> Result<()> {
        self.check_cons_index(cons)?;
        if self.cons_slot[cons] == ConsSlot::Unassigned {
            Ok(())
        } else {
            Err(DecompError::InvalidState(format!(
                "constraint {cons} is already assigned"
            )))
        }
    }

    fn check_var_unassigned(&self, var: usize) -> Result<()> {
        self.check_var_index(var)?;
        if self.var_slot[var] == VarSlot::Unassigned {
            Ok(())
        } else {
            Err(DecompError::InvalidState(format!(
                "variable {var} is already assigned"
            )))
        }
    }

    /// Puts `cons` into `block` without touching the open list.
    pub fn set_cons_to_block(&mut self, cons: usize, block: usize) -> Result<()> {
        self.check_cons_unassigned(cons)?;
        self.check_block(block)?;
        self.cons_slot[cons] = ConsSlot::Block(block);
        self.conss_for_blocks[block].push(cons);
        self.sorted = false;
        self.touch();
        Ok(())
    }

    /// Puts `cons` into the master problem without touching the open list.
    pub fn set_cons_to_master(&mut self, cons: usize) -> Result<()> {
        self.check_cons_unassigned(cons)?;
        self.cons_slot[cons] = ConsSlot::Master;
        self.master_conss.push(cons);
        self.sorted = false;
        self.touch();
        Ok(())
    }

    /// Puts `var` into `block` without touching the open list.
    pub fn set_var_to_block(&mut self, var: usize, block: usize) -> Result<()> {
        self.check_var_unassigned(var)?;
        self.check_block(block)?;
        self.var_slot[var] = VarSlot::Block(block);
        self.vars_for_blocks[block].push(var);
        self.sorted = false;
        self.touch();
        Ok(())
    }

    /// Makes `var` a master-only variable without touching the open list.
    pub fn set_var_to_master(&mut self, var: usize) -> Result<()> {
        self.check_var_unassigned(var)?;
        self.var_slot[var] = VarSlot::Master;
        self.master_vars.push(var);
        self.sorted = false;
        self.touch();
        Ok(())
    }

    /// Makes `var` a linking variable without touching the open list.
    pub fn set_var_to_linking(&mut self, var: usize) -> Result<()> {
        self.check_var_unassigned(var)?;
        self.var_slot[var] = VarSlot::Linking;
        self.linking_vars.push(var);
        self.sorted = false;
        self.touch();
        Ok(())
    }

    /// Makes `var` stairlinking between `block1` and `block2 = block1 + 1`
    /// without touching the open list.
    pub fn set_var_to_stairlinking(&mut self, var: usize, block1: usize, block2: usize) -> Result<()> {
        self.check_var_unassigned(var)?;
        if block2 != block1 + 1 {
            return Err(DecompError::InvalidState(format!(
                "stairlinking blocks {block1} and {block2} are not consecutive"
            )));
        }
        self.check_block(block2)?;
        self.var_slot[var] = VarSlot::Stairlinking(block1);
        self.stairlinking_vars[block1].push(var);
        self.sorted = false;
        self.touch();
        Ok(())
    }

    /// Removes `cons` from the open list.
    pub fn delete_open_cons(&mut self, cons: usize) -> Result<()> {
        self.check_cons_index(cons)?;
        if !self.cons_open[cons] {
            return Err(DecompError::NotOpen {
                what: "constraint",
                index: cons,
            });
        }
        self.cons_open[cons] = false;
        remove_value(&mut self.open_conss, cons);
        self.touch();
        Ok(())
    }

    /// Removes `var` from the open list.
    pub fn delete_open_var(&mut self, var: usize) -> Result<()> {
        self.check_var_index(var)?;
        if !self.var_open[var] {
            return Err(DecompError::NotOpen {
                what: "variable",
                index: var,
            });
        }
        self.var_open[var] = false;
        remove_value(&mut self.open_vars, var);
        self.touch();
        Ok(())
    }

    /// Takes an assigned variable out of its bucket so it can be
    /// reclassified. The variable does not become open.
    pub(crate) fn take_var(&mut self, var: usize) {
        match self.var_slot[var] {
            VarSlot::Unassigned => return,
            VarSlot::Master => remove_value(&mut self.master_vars, var),
            VarSlot::Block(block) => remove_value(&mut self.vars_for_blocks[block], var),
            VarSlot::Linking => remove_value(&mut self.linking_vars, var),
            VarSlot::Stairlinking(first) => remove_value(&mut self.stairlinking_vars[first], var),
        }
        self.var_slot[var] = VarSlot::Unassigned;
        self.touch();
    }

    /// Takes an assigned constraint out of its bucket; see [`take_var`](Self::take_var).
    pub(crate) fn take_cons(&mut self, cons: usize) {
        match self.cons_slot[cons] {
            ConsSlot::Unassigned => return,
            ConsSlot::Master => remove_value(&mut self.master_conss, cons),
            ConsSlot::Block(block) => remove_value(&mut self.conss_for_blocks[block], cons),
        }
        self.cons_slot[cons] = ConsSlot::Unassigned;
        self.touch();
    }

    /// Deletes blocks without constraints and relabels the rest densely.
    ///
    /// With `require_no_vars`, a block is only deleted if it also has no
    /// variables. Variables of a deleted block become open again, as do
    /// stairlinking variables whose two blocks stop being neighbors.
    /// Returns the number of deleted blocks.
    pub fn delete_empty_blocks(&mut self, require_no_vars: bool) -> Result<usize> {
        if !self.booked.is_empty() {
            return Err(DecompError::InvalidState(
                "cannot delete blocks while bookings are pending".to_string(),
            ));
        }
        let doomed: Vec<bool> = (0..self.n_blocks)
            .map(|block| {
                self.conss_for_blocks[block].is_empty()
                    && (!require_no_vars
                        || (self.vars_for_blocks[block].is_empty()
                            && self.stairlinking_vars[block].is_empty()))
            })
            .collect();
        let n_deleted = doomed.iter().filter(|&&d| d).count();
        if n_deleted == 0 {
            return Ok(0);
        }

        let mut new_index = vec![None; self.n_blocks];
        let mut n_kept = 0;
        for (block, &gone) in doomed.iter().enumerate() {
            if !gone {
                new_index[block] = Some(n_kept);
                n_kept += 1;
            }
        }

        let old_conss = std::mem::take(&mut self.conss_for_blocks);
        let old_vars = std::mem::take(&mut self.vars_for_blocks);
        let old_stairs = std::mem::take(&mut self.stairlinking_vars);
        self.conss_for_blocks = vec![Vec::new(); n_kept];
        self.vars_for_blocks = vec![Vec::new(); n_kept];
        self.stairlinking_vars = vec![Vec::new(); n_kept];

        let mut reopened = Vec::new();
        for (block, (conss, vars)) in old_conss.into_iter().zip(old_vars).enumerate() {
            match new_index[block] {
                Some(target) => {
                    for &cons in &conss {
                        self.cons_slot[cons] = ConsSlot::Block(target);
                    }
                    for &var in &vars {
                        self.var_slot[var] = VarSlot::Block(target);
                    }
                    self.conss_for_blocks[target] = conss;
                    self.vars_for_blocks[target] = vars;
                }
                None => reopened.extend(vars),
            }
        }
        for (block, stairs) in old_stairs.into_iter().enumerate() {
            let first = new_index[block];
            let second = new_index.get(block + 1).copied().flatten();
            match (first, second) {
                (Some(a), Some(b)) if b == a + 1 => {
                    for &var in &stairs {
                        self.var_slot[var] = VarSlot::Stairlinking(a);
                    }
                    self.stairlinking_vars[a] = stairs;
                }
                _ => reopened.extend(stairs),
            }
        }
        for &var in &reopened {
            self.var_slot[var] = VarSlot::Unassigned;
            self.var_open[var] = true;
            self.open_vars.push(var);
        }

        debug!(
            decomposition = self.id,
            deleted = n_deleted,
            remaining = n_kept,
            reopened_vars = reopened.len(),
            "deleted empty blocks"
        );

        self.n_blocks = n_kept;
        self.sorted = false;
        self.touch();
        Ok(n_deleted)
    }

    /// Relabels blocks: old block `b` becomes block `old_to_new[b]`.
    ///
    /// Stairlinking variables whose blocks stop being neighbors become
    /// linking variables.
    pub fn change_block_order(&mut self, old_to_new: &[usize]) -> Result<()> {
        if old_to_new.len() != self.n_blocks {
            return Err(DecompError::InvalidState(format!(
                "block order has {} entries for {} blocks",
                old_to_new.len(),
                self.n_blocks
            )));
        }
        let mut seen = vec![false; self.n_blocks];
        for &target in old_to_new {
            if target >= self.n_blocks || std::mem::replace(&mut seen[target], true) {
                return Err(DecompError::InvalidState(format!(
                    "block order {old_to_new:?} is not a permutation"
                )));
            }
        }

        let old_conss = std::mem::take(&mut self.conss_for_blocks);
        let old_vars = std::mem::take(&mut self.vars_for_blocks);
        let old_stairs = std::mem::take(&mut self.stairlinking_vars);
        self.conss_for_blocks = vec![Vec::new(); self.n_blocks];
        self.vars_for_blocks = vec![Vec::new(); self.n_blocks];
        self.stairlinking_vars = vec![Vec::new(); self.n_blocks];

        for (block, (conss, vars)) in old_conss.into_iter().zip(old_vars).enumerate() {
            let target = old_to_new[block];
            for &cons in &conss {
                self.cons_slot[cons] = ConsSlot::Block(target);
            }
            for &var in &vars {
                self.var_slot[var] = VarSlot::Block(target);
            }
            self.conss_for_blocks[target] = conss;
            self.vars_for_blocks[target] = vars;
        }
        for (block, stairs) in old_stairs.into_iter().enumerate() {
            if stairs.is_empty() {
                continue;
            }
            let a = old_to_new[block];
            let b = old_to_new[block + 1];
            let first = if b == a + 1 {
                Some(a)
            } else if a == b + 1 {
                Some(b)
            } else {
                None
            };
            match first {
                Some(first) => {
                    for &var in &stairs {
                        self.var_slot[var] = VarSlot::Stairlinking(first);
                    }
                    self.stairlinking_vars[first].extend(stairs);
                }
                None => {
                    for &var in &stairs {
                        self.var_slot[var] = VarSlot::Linking;
                    }
                    self.linking_vars.extend(stairs);
                }
            }
        }

        self.sorted = false;
        self.touch();
        Ok(())
    }

    /// Sorts every index vector ascending.
    ///
    /// Sorting does not change which bucket any index is in, so cached
    /// values stay valid.
    pub fn sort(&mut self) {
        self.open_conss.sort_unstable();
        self.open_vars.sort_unstable();
        self.master_conss.sort_unstable();
        self.master_vars.sort_unstable();
        self.linking_vars.sort_unstable();
        for block in 0..self.n_blocks {
            self.conss_for_blocks[block].sort_unstable();
            self.vars_for_blocks[block].sort_unstable();
            self.stairlinking_vars[block].sort_unstable();
        }
        self.sorted = true;
    }
}
