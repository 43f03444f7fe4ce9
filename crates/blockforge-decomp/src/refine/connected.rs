use std::collections::VecDeque;

use tracing::debug;

use super::{insert_sorted, intersect, BlockSet};
use crate::error::Result;
use crate::partial::{ConsSlot, PartialDecomposition, VarSlot};

/// A connected set of open constraints and the open variables joining them.
struct Component {
    conss: Vec<usize>,
    vars: Vec<usize>,
    /// Blocks every member is compatible with; `None` if no member touches
    /// an existing block.
    compatible: Option<BlockSet>,
}

impl PartialDecomposition<'_> {
    /// Completes the decomposition along connected components.
    ///
    /// After the implicit rules, open constraints are grouped into
    /// components connected through open variables; linking, stairlinking
    /// and master variables never connect. Components are discovered in
    /// ascending constraint order. A component compatible with existing
    /// blocks joins the lowest of them, one that touches no block becomes a
    /// new block, and one that touches incompatible blocks goes to the
    /// master. Variables left open afterwards are classified by the blocks
    /// of their constraints.
    pub fn complete_by_connected(&mut self) -> Result<()> {
        self.consider_implicits()?;
        if self.is_complete() {
            return Ok(());
        }

        let components = self.open_components();
        let n_blocks_before = self.n_blocks;
        let mut n_to_master = 0;
        for component in &components {
            match &component.compatible {
                None => {
                    let block = self.add_block();
                    self.commit_component(component, block);
                }
                Some(blocks) => match blocks.first() {
                    Some(&block) => self.commit_component(component, block),
                    None => {
                        for &cons in &component.conss {
                            self.commit_cons(cons, ConsSlot::Master);
                        }
                        n_to_master += component.conss.len();
                    }
                },
            }
        }
        self.prune_open();
        self.resolve_open_vars();

        debug!(
            decomposition = self.id,
            components = components.len(),
            new_blocks = self.n_blocks - n_blocks_before,
            conss_to_master = n_to_master,
            "completed by connected components"
        );
        Ok(())
    }

    fn commit_component(&mut self, component: &Component, block: usize) {
        for &cons in &component.conss {
            self.commit_cons(cons, ConsSlot::Block(block));
        }
        for &var in &component.vars {
            self.commit_var(var, VarSlot::Block(block));
        }
    }

    /// Breadth-first search over open constraints through open variables.
    fn open_components(&self) -> Vec<Component> {
        let mut cons_seen = vec![false; self.n_conss()];
        let mut var_seen = vec![false; self.n_vars()];
        let mut starts = self.open_conss.clone();
        starts.sort_unstable();

        let mut components = Vec::new();
        let mut queue = VecDeque::new();
        for start in starts {
            if cons_seen[start] {
                continue;
            }
            cons_seen[start] = true;
            queue.push_back(start);

            let mut component = Component {
                conss: Vec::new(),
                vars: Vec::new(),
                compatible: None,
            };
            while let Some(cons) = queue.pop_front() {
                component.conss.push(cons);
                let hood = self.cons_neighborhood(cons);
                if let Some(allowed) = &hood.compatible {
                    component.compatible = intersect(component.compatible.take(), allowed);
                }
                for &var in self.space.vars_for_cons(cons) {
                    if !self.var_open[var] || var_seen[var] {
                        continue;
                    }
                    var_seen[var] = true;
                    component.vars.push(var);
                    let mut var_blocks = BlockSet::new();
                    for &next in self.space.conss_for_var(var) {
                        if self.cons_open[next] {
                            if !cons_seen[next] {
                                cons_seen[next] = true;
                                queue.push_back(next);
                            }
                        } else if let ConsSlot::Block(block) = self.cons_slot[next] {
                            insert_sorted(&mut var_blocks, block);
                        }
                    }
                    for block in var_blocks {
                        component.compatible = intersect(component.compatible.take(), &[block]);
                    }
                }
                if hood.hits_master_var || hood.var_blocks.len() > 1 {
                    component.compatible = Some(BlockSet::new());
                }
            }
            components.push(component);
        }
        components
    }
}
