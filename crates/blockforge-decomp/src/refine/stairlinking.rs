use std::collections::BTreeMap;

use tracing::debug;

use crate::error::Result;
use crate::partial::{PartialDecomposition, VarSlot};

impl PartialDecomposition<'_> {
    /// Makes open variables stairlinking if all their constraints are
    /// assigned and their block constraints lie in exactly two consecutive
    /// blocks. Returns whether any variable moved.
    pub fn assign_current_stairlinking(&mut self) -> Result<bool> {
        self.flush_booked()?;
        for &var in &self.open_vars.clone() {
            if self.var_hits_open_cons(var) {
                continue;
            }
            if let [first, second] = self.blocks_hit_by_var(var).as_slice() {
                if *second == *first + 1 {
                    self.book_as_stairlinking_var(var, *first)?;
                }
            }
        }
        let moved = self.n_booked() > 0;
        self.flush_booked()?;
        Ok(moved)
    }

    /// Turns linking variables into stairlinking variables where their
    /// block constraints lie in exactly two consecutive blocks. Returns the
    /// number of converted variables.
    pub fn find_vars_linking_to_stairlinking(&mut self) -> usize {
        let mut converted = 0;
        for var in self.linking_vars.clone() {
            if self.var_hits_open_cons(var) {
                continue;
            }
            if let [first, second] = self.blocks_hit_by_var(var).as_slice() {
                if *second == *first + 1 {
                    let first = *first;
                    self.take_var(var);
                    self.var_slot[var] = VarSlot::Stairlinking(first);
                    self.stairlinking_vars[first].push(var);
                    converted += 1;
                }
            }
        }
        if converted > 0 {
            self.sorted = false;
            self.touch();
        }
        converted
    }

    /// Turns linking variables that hit only master constraints into master
    /// variables. Returns the number of converted variables.
    pub fn find_vars_linking_to_master(&mut self) -> usize {
        let mut converted = 0;
        for var in self.linking_vars.clone() {
            if self.var_hits_open_cons(var) || !self.blocks_hit_by_var(var).is_empty() {
                continue;
            }
            self.take_var(var);
            self.var_slot[var] = VarSlot::Master;
            self.master_vars.push(var);
            converted += 1;
        }
        if converted > 0 {
            self.sorted = false;
            self.touch();
        }
        converted
    }

    /// Reorders blocks so that blocks sharing linking variables become
    /// neighbors, then converts the linking variables that now join two
    /// consecutive blocks into stairlinking variables.
    ///
    /// Blocks form a graph weighted by the number of linking variables
    /// hitting exactly that pair. The path starts at the connected block of
    /// least weighted degree (lowest index on ties) and always continues to
    /// the heaviest unvisited neighbor (lowest index on ties). When the
    /// path is stuck it restarts from the remaining block of least degree.
    /// Returns the number of new stairlinking variables.
    pub fn change_block_order_greedily(&mut self) -> Result<usize> {
        self.flush_booked()?;
        if self.n_blocks < 2 {
            return Ok(0);
        }

        let mut weights: BTreeMap<(usize, usize), usize> = BTreeMap::new();
        for &var in &self.linking_vars {
            if let [a, b] = self.blocks_hit_by_var(var).as_slice() {
                *weights.entry((*a, *b)).or_default() += 1;
            }
        }
        if weights.is_empty() {
            return Ok(0);
        }

        let n = self.n_blocks;
        let mut adjacency = vec![vec![0usize; n]; n];
        let mut degree = vec![0usize; n];
        for (&(a, b), &w) in &weights {
            adjacency[a][b] = w;
            adjacency[b][a] = w;
            degree[a] += w;
            degree[b] += w;
        }

        let mut visited = vec![false; n];
        let mut path = Vec::with_capacity(n);
        let pick_start = |visited: &[bool]| {
            (0..n)
                .filter(|&b| !visited[b])
                .min_by_key(|&b| (degree[b] == 0, degree[b], b))
        };
        let mut current = pick_start(&visited);
        while let Some(block) = current {
            visited[block] = true;
            path.push(block);
            current = (0..n)
                .filter(|&next| !visited[next] && adjacency[block][next] > 0)
                .max_by_key(|&next| (adjacency[block][next], std::cmp::Reverse(next)))
                .or_else(|| pick_start(&visited));
        }

        let mut old_to_new = vec![0; n];
        for (position, &block) in path.iter().enumerate() {
            old_to_new[block] = position;
        }
        self.change_block_order(&old_to_new)?;
        let converted = self.find_vars_linking_to_stairlinking();

        debug!(
            decomposition = self.id,
            order = ?path,
            stairlinking = converted,
            "reordered blocks greedily"
        );
        Ok(converted)
    }
}
