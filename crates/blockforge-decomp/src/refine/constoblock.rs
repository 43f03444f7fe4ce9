use std::collections::HashMap;

use tracing::debug;

use crate::error::{DecompError, Result};
use crate::partial::PartialDecomposition;

impl PartialDecomposition<'_> {
    fn check_cons_to_block(
        &self,
        cons_to_block: &HashMap<usize, usize>,
        n_blocks: usize,
    ) -> Result<Vec<(usize, usize)>> {
        if n_blocks < self.n_blocks {
            return Err(DecompError::InvalidState(format!(
                "map has {n_blocks} blocks but the decomposition already has {}",
                self.n_blocks
            )));
        }
        let mut entries: Vec<(usize, usize)> =
            cons_to_block.iter().map(|(&c, &b)| (c, b)).collect();
        entries.sort_unstable();
        for &(cons, block) in &entries {
            self.check_cons_index(cons)?;
            if !self.is_cons_open(cons) {
                return Err(DecompError::NotOpen {
                    what: "constraint",
                    index: cons,
                });
            }
            if block > n_blocks {
                return Err(DecompError::BlockOutOfRange { block, n_blocks });
            }
        }
        Ok(entries)
    }

    /// Assigns constraints from a constraint-to-block map, where block
    /// `n_blocks` stands for the master, then derives the variables.
    ///
    /// Blocks that receive no constraint are dropped. Variables whose
    /// constraints are all assigned afterwards are classified by the blocks
    /// of their constraints; the others stay open.
    pub fn assign_from_cons_to_block(
        &mut self,
        cons_to_block: &HashMap<usize, usize>,
        n_blocks: usize,
    ) -> Result<()> {
        self.flush_booked()?;
        let entries = self.check_cons_to_block(cons_to_block, n_blocks)?;
        self.set_n_blocks(n_blocks)?;
        for (cons, block) in entries {
            if block == n_blocks {
                self.book_as_master_cons(cons)?;
            } else {
                self.book_as_block_cons(cons, block)?;
            }
        }
        self.flush_booked()?;
        let deleted = self.delete_empty_blocks(false)?;
        self.resolve_open_vars();

        debug!(
            decomposition = self.id,
            blocks = self.n_blocks,
            deleted_blocks = deleted,
            "assigned from constraint map"
        );
        Ok(())
    }

    /// Takes only the master constraints of a constraint-to-block map;
    /// everything else stays open.
    pub fn assign_border_from_cons_to_block(
        &mut self,
        cons_to_block: &HashMap<usize, usize>,
        n_blocks: usize,
    ) -> Result<()> {
        self.flush_booked()?;
        let entries = self.check_cons_to_block(cons_to_block, n_blocks)?;
        for (cons, block) in entries {
            if block == n_blocks {
                self.book_as_master_cons(cons)?;
            }
        }
        self.flush_booked()
    }
}
