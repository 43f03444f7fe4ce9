//! Two-phase assignment: book now, commit on flush.

use tracing::trace;

use super::{ConsSlot, PartialDecomposition, VarSlot};
use crate::error::{DecompError, Result};

/// Pending assignments that have not been committed yet.
#[derive(Debug, Clone, Default)]
pub(crate) struct Bookings {
    pub(crate) master_conss: Vec<usize>,
    pub(crate) block_conss: Vec<(usize, usize)>,
    pub(crate) master_vars: Vec<usize>,
    pub(crate) block_vars: Vec<(usize, usize)>,
    pub(crate) linking_vars: Vec<usize>,
    pub(crate) stairlinking_vars: Vec<(usize, usize)>,
}

impl Bookings {
    pub(crate) fn len(&self) -> usize {
        self.master_conss.len()
            + self.block_conss.len()
            + self.master_vars.len()
            + self.block_vars.len()
            + self.linking_vars.len()
            + self.stairlinking_vars.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn conss(&self) -> impl Iterator<Item = usize> + '_ {
        self.master_conss
            .iter()
            .copied()
            .chain(self.block_conss.iter().map(|&(cons, _)| cons))
    }

    fn vars(&self) -> impl Iterator<Item = usize> + '_ {
        self.master_vars
            .iter()
            .copied()
            .chain(self.block_vars.iter().map(|&(var, _)| var))
            .chain(self.linking_vars.iter().copied())
            .chain(self.stairlinking_vars.iter().map(|&(var, _)| var))
    }
}

impl PartialDecomposition<'_> {
    fn check_open_cons(&self, cons: usize) -> Result<()> {
        self.check_cons_index(cons)?;
        if self.cons_open[cons] {
            Ok(())
        } else {
            Err(DecompError::NotOpen {
                what: "constraint",
                index: cons,
            })
        }
    }

    fn check_open_var(&self, var: usize) -> Result<()> {
        self.check_var_index(var)?;
        if self.var_open[var] {
            Ok(())
        } else {
            Err(DecompError::NotOpen {
                what: "variable",
                index: var,
            })
        }
    }

    /// Books an open constraint for the master problem.
    pub fn book_as_master_cons(&mut self, cons: usize) -> Result<()> {
        self.check_open_cons(cons)?;
        self.booked.master_conss.push(cons);
        Ok(())
    }

    /// Books an open constraint for `block`.
    pub fn book_as_block_cons(&mut self, cons: usize, block: usize) -> Result<()> {
        self.check_open_cons(cons)?;
        self.check_block(block)?;
        self.booked.block_conss.push((cons, block));
        Ok(())
    }

    /// Books an open variable as master-only variable.
    pub fn book_as_master_var(&mut self, var: usize) -> Result<()> {
        self.check_open_var(var)?;
        self.booked.master_vars.push(var);
        Ok(())
    }

    /// Books an open variable for `block`.
    pub fn book_as_block_var(&mut self, var: usize, block: usize) -> Result<()> {
        self.check_open_var(var)?;
        self.check_block(block)?;
        self.booked.block_vars.push((var, block));
        Ok(())
    }

    /// Books an open variable as linking variable.
    pub fn book_as_linking_var(&mut self, var: usize) -> Result<()> {
        self.check_open_var(var)?;
        self.booked.linking_vars.push(var);
        Ok(())
    }

    /// Books an open variable as stairlinking between `first_block` and
    /// `first_block + 1`.
    pub fn book_as_stairlinking_var(&mut self, var: usize, first_block: usize) -> Result<()> {
        self.check_open_var(var)?;
        self.check_block(first_block + 1)?;
        self.booked.stairlinking_vars.push((var, first_block));
        Ok(())
    }

    /// Number of pending bookings.
    pub fn n_booked(&self) -> usize {
        self.booked.len()
    }

    /// Drops all pending bookings without applying them.
    pub fn clear_booked(&mut self) {
        self.booked = Default::default();
    }

    /// Commits every pending booking.
    ///
    /// Each booked index leaves the open list and enters its bucket; the
    /// booking lists are cleared. With nothing booked this is a no-op.
    ///
    /// # Errors
    ///
    /// If an index was booked twice, is no longer open, or names a block
    /// that no longer exists, the bookings are discarded and the
    /// decomposition is left exactly as it was.
    pub fn flush_booked(&mut self) -> Result<()> {
        if self.booked.is_empty() {
            return Ok(());
        }
        let booked = std::mem::take(&mut self.booked);
        self.validate_bookings(&booked)?;

        trace!(
            decomposition = self.id,
            n_booked = booked.len(),
            "flushing bookings"
        );

        for &cons in &booked.master_conss {
            self.commit_cons(cons, ConsSlot::Master);
        }
        for &(cons, block) in &booked.block_conss {
            self.commit_cons(cons, ConsSlot::Block(block));
        }
        for &var in &booked.master_vars {
            self.commit_var(var, VarSlot::Master);
        }
        for &(var, block) in &booked.block_vars {
            self.commit_var(var, VarSlot::Block(block));
        }
        for &var in &booked.linking_vars {
            self.commit_var(var, VarSlot::Linking);
        }
        for &(var, first_block) in &booked.stairlinking_vars {
            self.commit_var(var, VarSlot::Stairlinking(first_block));
        }
        self.prune_open();
        Ok(())
    }

    /// Moves an open constraint into the bucket named by `slot`.
    ///
    /// The open list is only cleaned up by [`prune_open`](Self::prune_open),
    /// so a batch of commits must be followed by one prune.
    pub(crate) fn commit_cons(&mut self, cons: usize, slot: ConsSlot) {
        match slot {
            ConsSlot::Unassigned => return,
            ConsSlot::Master => self.master_conss.push(cons),
            ConsSlot::Block(block) => self.conss_for_blocks[block].push(cons),
        }
        self.cons_slot[cons] = slot;
        self.cons_open[cons] = false;
    }

    /// Moves an open variable into the bucket named by `slot`; see
    /// [`commit_cons`](Self::commit_cons).
    pub(crate) fn commit_var(&mut self, var: usize, slot: VarSlot) {
        match slot {
            VarSlot::Unassigned => return,
            VarSlot::Master => self.master_vars.push(var),
            VarSlot::Block(block) => self.vars_for_blocks[block].push(var),
            VarSlot::Linking => self.linking_vars.push(var),
            VarSlot::Stairlinking(first) => self.stairlinking_vars[first].push(var),
        }
        self.var_slot[var] = slot;
        self.var_open[var] = false;
    }

    /// Drops committed indices from the open lists.
    pub(crate) fn prune_open(&mut self) {
        let cons_open = &self.cons_open;
        self.open_conss.retain(|&cons| cons_open[cons]);
        let var_open = &self.var_open;
        self.open_vars.retain(|&var| var_open[var]);
        self.sorted = false;
        self.touch();
    }

    fn validate_bookings(&self, booked: &Bookings) -> Result<()> {
        let mut cons_seen = vec![false; self.n_conss()];
        for cons in booked.conss() {
            if !self.cons_open[cons] {
                return Err(DecompError::NotOpen {
                    what: "constraint",
                    index: cons,
                });
            }
            if self.cons_slot[cons] != ConsSlot::Unassigned {
                return Err(DecompError::InvalidState(format!(
                    "constraint {cons} is open but already assigned"
                )));
            }
            if std::mem::replace(&mut cons_seen[cons], true) {
                return Err(DecompError::InvalidState(format!(
                    "constraint {cons} booked twice"
                )));
            }
        }
        let mut var_seen = vec![false; self.n_vars()];
        for var in booked.vars() {
            if !self.var_open[var] {
                return Err(DecompError::NotOpen {
                    what: "variable",
                    index: var,
                });
            }
            if self.var_slot[var] != VarSlot::Unassigned {
                return Err(DecompError::InvalidState(format!(
                    "variable {var} is open but already assigned"
                )));
            }
            if std::mem::replace(&mut var_seen[var], true) {
                return Err(DecompError::InvalidState(format!(
                    "variable {var} booked twice"
                )));
            }
        }
        let blocks = booked
            .block_conss
            .iter()
            .map(|&(_, block)| block)
            .chain(booked.block_vars.iter().map(|&(_, block)| block))
            .chain(booked.stairlinking_vars.iter().map(|&(_, block)| block + 1));
        for block in blocks {
            self.check_block(block)?;
        }
        Ok(())
    }
}
