use tracing::debug;

use crate::error::Result;
use crate::partial::{ConsSlot, PartialDecomposition, VarSlot};

impl PartialDecomposition<'_> {
    /// Completes the decomposition first-fit.
    ///
    /// Open variables already determined by block constraints are assigned
    /// first. Open constraints are then scanned in ascending order: one that
    /// hits a master variable or variables of two blocks goes to the master,
    /// any other joins the lowest block none of its assigned variables
    /// contradicts, and one that touches no block opens a new block. The open
    /// variables of a constraint placed in a block follow it unless they
    /// already sit in another block's constraints, in which case they become
    /// linking.
    pub fn complete_greedily(&mut self) -> Result<()> {
        self.flush_booked()?;
        if self.is_complete() {
            return Ok(());
        }

        for &var in &self.open_vars.clone() {
            match self.blocks_hit_by_var(var).as_slice() {
                [] => {}
                [block] => self.book_as_block_var(var, *block)?,
                _ => self.book_as_linking_var(var)?,
            }
        }
        self.flush_booked()?;

        let space = self.space;
        let mut conss = self.open_conss.clone();
        conss.sort_unstable();
        let mut n_to_master = 0;
        for cons in conss {
            let hood = self.cons_neighborhood(cons);
            if hood.forces_master() {
                self.commit_cons(cons, ConsSlot::Master);
                n_to_master += 1;
                continue;
            }
            let block = match hood.compatible.as_deref() {
                Some([first, ..]) => *first,
                _ => self.add_block(),
            };
            self.commit_cons(cons, ConsSlot::Block(block));
            for &var in space.vars_for_cons(cons) {
                if !self.var_open[var] {
                    continue;
                }
                let slot = match self.blocks_hit_by_var(var).as_slice() {
                    [only] if *only == block => VarSlot::Block(block),
                    _ => VarSlot::Linking,
                };
                self.commit_var(var, slot);
            }
        }
        self.prune_open();
        self.resolve_open_vars();

        debug!(
            decomposition = self.id,
            blocks = self.n_blocks,
            conss_to_master = n_to_master,
            "completed greedily"
        );
        Ok(())
    }
}
