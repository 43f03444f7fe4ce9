use tracing::debug;

use crate::error::Result;
use crate::partial::PartialDecomposition;

impl PartialDecomposition<'_> {
    /// Books every assignment that is forced by the current state and
    /// flushes them together.
    ///
    /// Constraints: hitting a master variable or block variables of two
    /// blocks sends a constraint to the master; a constraint without open
    /// variables goes to its single compatible block, or to the master if
    /// it has none. Variables: appearing in block constraints of two blocks
    /// makes a variable linking; once all its constraints are assigned a
    /// variable joins its single block, or the master if it hits no block.
    ///
    /// Pending bookings are flushed first. All rules then read the state as
    /// it was before the call.
    pub fn consider_implicits(&mut self) -> Result<()> {
        self.flush_booked()?;
        let mut n_conss = 0;
        for &cons in &self.open_conss.clone() {
            let hood = self.cons_neighborhood(cons);
            if hood.forces_master() {
                self.book_as_master_cons(cons)?;
            } else if !hood.hits_open_var {
                match &hood.compatible {
                    None => self.book_as_master_cons(cons)?,
                    Some(blocks) if blocks.len() == 1 => {
                        self.book_as_block_cons(cons, blocks[0])?
                    }
                    Some(_) => continue,
                }
            } else {
                continue;
            }
            n_conss += 1;
        }

        let mut n_vars = 0;
        for &var in &self.open_vars.clone() {
            let blocks = self.blocks_hit_by_var(var);
            if blocks.len() >= 2 {
                self.book_as_linking_var(var)?;
            } else if self.var_hits_open_cons(var) {
                continue;
            } else if let Some(&block) = blocks.first() {
                self.book_as_block_var(var, block)?;
            } else {
                self.book_as_master_var(var)?;
            }
            n_vars += 1;
        }

        if n_conss + n_vars > 0 {
            debug!(
                decomposition = self.id,
                conss = n_conss,
                vars = n_vars,
                "implicit assignments"
            );
        }
        self.flush_booked()
    }

    /// Sends each open constraint whose assigned variables all fit one block
    /// to that block. Returns whether anything moved.
    pub fn assign_hitting_open_conss(&mut self) -> Result<bool> {
        self.flush_booked()?;
        for &cons in &self.open_conss.clone() {
            let hood = self.cons_neighborhood(cons);
            if hood.var_blocks.len() > 1 {
                continue;
            }
            if let Some(block) = hood.single_block() {
                self.book_as_block_cons(cons, block)?;
            }
        }
        let moved = self.n_booked() > 0;
        self.flush_booked()?;
        Ok(moved)
    }

    /// Sends each open variable whose block constraints all lie in one block
    /// to that block. Returns whether anything moved.
    pub fn assign_hitting_open_vars(&mut self) -> Result<bool> {
        self.flush_booked()?;
        for &var in &self.open_vars.clone() {
            if let [block] = self.blocks_hit_by_var(var).as_slice() {
                self.book_as_block_var(var, *block)?;
            }
        }
        let moved = self.n_booked() > 0;
        self.flush_booked()?;
        Ok(moved)
    }

    /// Moves open constraints that already straddle blocks or touch master
    /// variables to the master, and open variables hitting block constraints
    /// of two or more blocks to the linking variables. Returns whether
    /// anything moved.
    pub fn assign_open_partial_hitting_to_master(&mut self) -> Result<bool> {
        self.flush_booked()?;
        for &cons in &self.open_conss.clone() {
            if self.cons_neighborhood(cons).forces_master() {
                self.book_as_master_cons(cons)?;
            }
        }
        for &var in &self.open_vars.clone() {
            if self.blocks_hit_by_var(var).len() >= 2 {
                self.book_as_linking_var(var)?;
            }
        }
        let moved = self.n_booked() > 0;
        self.flush_booked()?;
        Ok(moved)
    }
}
