use tracing::debug;

use super::{insert_sorted, BlockSet};
use crate::error::Result;
use crate::partial::{ConsSlot, PartialDecomposition, VarSlot};

impl PartialDecomposition<'_> {
    /// Moves master constraints back into a block where that is possible.
    ///
    /// A master constraint qualifies if its block variables all belong to
    /// one block and it hits no linking or stairlinking variable. It moves
    /// to that block and its master variables become variables of the same
    /// block. Returns whether any constraint moved.
    pub fn postprocess_master_to_blocks(&mut self) -> Result<bool> {
        self.flush_booked()?;
        let space = self.space;
        let mut n_moved = 0;
        for cons in self.master_conss.clone() {
            let mut blocks = BlockSet::new();
            let mut master_vars = Vec::new();
            let mut movable = true;
            for &var in space.vars_for_cons(cons) {
                if self.var_open[var] {
                    continue;
                }
                match self.var_slot[var] {
                    VarSlot::Block(block) => insert_sorted(&mut blocks, block),
                    VarSlot::Master => master_vars.push(var),
                    VarSlot::Linking | VarSlot::Stairlinking(_) => {
                        movable = false;
                        break;
                    }
                    VarSlot::Unassigned => {}
                }
            }
            let target = match blocks.as_slice() {
                [block] if movable => *block,
                _ => continue,
            };

            self.take_cons(cons);
            self.cons_slot[cons] = ConsSlot::Block(target);
            self.conss_for_blocks[target].push(cons);
            for var in master_vars {
                self.take_var(var);
                self.var_slot[var] = VarSlot::Block(target);
                self.vars_for_blocks[target].push(var);
            }
            n_moved += 1;
        }

        if n_moved > 0 {
            self.sorted = false;
            self.touch();
            debug!(
                decomposition = self.id,
                moved = n_moved,
                "moved master constraints to blocks"
            );
        }
        Ok(n_moved > 0)
    }
}
