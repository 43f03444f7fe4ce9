//! Structural invariants of the assignment state.

use super::{ConsSlot, PartialDecomposition, VarSlot};

fn is_sorted(values: &[usize]) -> bool {
    values.windows(2).all(|w| w[0] <= w[1])
}

impl PartialDecomposition<'_> {
    /// Returns true if no invariant is violated.
    ///
    /// Pending bookings are ignored; only committed state is checked.
    pub fn check_consistency(&self) -> bool {
        self.consistency_violations().is_empty()
    }

    /// Lists every violated invariant in human-readable form.
    pub fn consistency_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        self.check_partition(&mut violations);
        self.check_blocks(&mut violations);
        self.check_sorted(&mut violations);
        self.check_var_adjacency(&mut violations);
        violations
    }

    fn check_partition(&self, violations: &mut Vec<String>) {
        let n_conss = self.n_conss();
        let n_vars = self.n_vars();

        let mut cons_seen = vec![0usize; n_conss];
        let mut note_cons = |cons: usize, expected: ConsSlot, open: bool, violations: &mut Vec<String>| {
            if cons >= n_conss {
                violations.push(format!("constraint index {cons} out of range"));
                return;
            }
            cons_seen[cons] += 1;
            if self.cons_open[cons] != open || (!open && self.cons_slot[cons] != expected) {
                violations.push(format!(
                    "constraint {cons} listed as {expected:?} (open: {open}) but recorded as {:?} (open: {})",
                    self.cons_slot[cons], self.cons_open[cons]
                ));
            }
        };
        for &cons in &self.open_conss {
            note_cons(cons, ConsSlot::Unassigned, true, violations);
        }
        for &cons in &self.master_conss {
            note_cons(cons, ConsSlot::Master, false, violations);
        }
        for (block, conss) in self.conss_for_blocks.iter().enumerate() {
            for &cons in conss {
                note_cons(cons, ConsSlot::Block(block), false, violations);
            }
        }
        for (cons, &count) in cons_seen.iter().enumerate() {
            if count != 1 {
                violations.push(format!("constraint {cons} appears {count} times"));
            }
        }

        let mut var_seen = vec![0usize; n_vars];
        let mut note_var = |var: usize, expected: VarSlot, open: bool, violations: &mut Vec<String>| {
            if var >= n_vars {
                violations.push(format!("variable index {var} out of range"));
                return;
            }
            var_seen[var] += 1;
            if self.var_open[var] != open || (!open && self.var_slot[var] != expected) {
                violations.push(format!(
                    "variable {var} listed as {expected:?} (open: {open}) but recorded as {:?} (open: {})",
                    self.var_slot[var], self.var_open[var]
                ));
            }
        };
        for &var in &self.open_vars {
            note_var(var, VarSlot::Unassigned, true, violations);
        }
        for &var in &self.master_vars {
            note_var(var, VarSlot::Master, false, violations);
        }
        for &var in &self.linking_vars {
            note_var(var, VarSlot::Linking, false, violations);
        }
        for (block, vars) in self.vars_for_blocks.iter().enumerate() {
            for &var in vars {
                note_var(var, VarSlot::Block(block), false, violations);
            }
        }
        for (block, vars) in self.stairlinking_vars.iter().enumerate() {
            for &var in vars {
                note_var(var, VarSlot::Stairlinking(block), false, violations);
            }
        }
        for (var, &count) in var_seen.iter().enumerate() {
            if count != 1 {
                violations.push(format!("variable {var} appears {count} times"));
            }
        }
    }

    fn check_blocks(&self, violations: &mut Vec<String>) {
        if self.conss_for_blocks.len() != self.n_blocks
            || self.vars_for_blocks.len() != self.n_blocks
            || self.stairlinking_vars.len() != self.n_blocks
        {
            violations.push(format!(
                "block vectors do not match {} blocks",
                self.n_blocks
            ));
            return;
        }
        for block in 0..self.n_blocks {
            if self.conss_for_blocks[block].is_empty() {
                violations.push(format!("block {block} has no constraints"));
            }
        }
        if let Some(last) = self.stairlinking_vars.last() {
            if !last.is_empty() {
                violations.push(format!(
                    "last block {} has stairlinking variables to a successor",
                    self.n_blocks - 1
                ));
            }
        }
    }

    fn check_sorted(&self, violations: &mut Vec<String>) {
        if !self.sorted {
            return;
        }
        let all_sorted = is_sorted(&self.open_conss)
            && is_sorted(&self.open_vars)
            && is_sorted(&self.master_conss)
            && is_sorted(&self.master_vars)
            && is_sorted(&self.linking_vars)
            && self.conss_for_blocks.iter().all(|v| is_sorted(v))
            && self.vars_for_blocks.iter().all(|v| is_sorted(v))
            && self.stairlinking_vars.iter().all(|v| is_sorted(v));
        if !all_sorted {
            violations.push("sorted flag is set but vectors are unsorted".to_string());
        }
    }

    fn check_var_adjacency(&self, violations: &mut Vec<String>) {
        for var in 0..self.n_vars() {
            let conss = self.space.conss_for_var(var);
            match self.var_slot[var] {
                VarSlot::Master => {
                    if let Some(&cons) = conss
                        .iter()
                        .find(|&&c| matches!(self.cons_slot[c], ConsSlot::Block(_)))
                    {
                        violations.push(format!(
                            "master variable {var} hits block constraint {cons}"
                        ));
                    }
                }
                VarSlot::Block(block) => {
                    let foreign = conss.iter().find(|&&c| {
                        matches!(self.cons_slot[c], ConsSlot::Block(other) if other != block)
                    });
                    if let Some(&cons) = foreign {
                        violations.push(format!(
                            "variable {var} of block {block} hits constraint {cons} of another block"
                        ));
                    }
                }
                VarSlot::Stairlinking(first) => {
                    let foreign = conss.iter().find(|&&c| {
                        matches!(self.cons_slot[c], ConsSlot::Block(b) if b != first && b != first + 1)
                    });
                    if let Some(&cons) = foreign {
                        violations.push(format!(
                            "stairlinking variable {var} of blocks {first}/{} hits constraint {cons} outside them",
                            first + 1
                        ));
                    }
                }
                VarSlot::Linking => {
                    if self.is_linking_in_single_block(conss) {
                        violations.push(format!(
                            "linking variable {var} only hits a single block"
                        ));
                    }
                }
                VarSlot::Unassigned => {}
            }
        }
    }

    /// True if every non-master constraint in `conss` sits in one and the
    /// same block.
    fn is_linking_in_single_block(&self, conss: &[usize]) -> bool {
        let mut block = None;
        for &cons in conss {
            match self.cons_slot[cons] {
                ConsSlot::Master => {}
                ConsSlot::Unassigned => return false,
                ConsSlot::Block(b) => match block {
                    None => block = Some(b),
                    Some(seen) if seen != b => return false,
                    Some(_) => {}
                },
            }
        }
        block.is_some()
    }
}
