//! Constraint and variable classifiers.
//!
//! A classifier partitions the constraints (or variables) of an index space
//! into named classes. Every index belongs to exactly one class once the
//! classifier is complete. Each class carries a decision that detectors read
//! when seeding a decomposition, for example "this class belongs in the
//! master problem".

mod builtin;

#[cfg(test)]
mod tests;

use std::fmt::Debug;

use crate::error::{CoreError, Result};

/// What a detector should do with the constraints of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConsClassDecision {
    /// No restriction.
    #[default]
    BlockOrMaster,
    /// Constraints of this class go to the master problem.
    OnlyMaster,
}

/// What a detector should do with the variables of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VarClassDecision {
    /// No restriction.
    #[default]
    All,
    /// Variables of this class are linking variables.
    Linking,
    /// Variables of this class are master-only variables.
    Master,
    /// Variables of this class belong to blocks.
    Block,
}

/// Metadata of one class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassInfo<D> {
    pub name: String,
    pub description: String,
    pub decision: D,
}

/// Partition of `0..n_indices` into named classes with a decision each.
#[derive(Debug, Clone)]
pub struct IndexClassifier<D> {
    name: String,
    classes: Vec<ClassInfo<D>>,
    class_of: Vec<Option<usize>>,
}

/// Classifier over constraint indices.
pub type ConsClassifier = IndexClassifier<ConsClassDecision>;

/// Classifier over variable indices.
pub type VarClassifier = IndexClassifier<VarClassDecision>;

impl<D: Copy + Default + Debug + PartialEq> IndexClassifier<D> {
    /// Creates a classifier over `n_indices` indices with no classes yet.
    pub fn new(name: impl Into<String>, n_indices: usize) -> Self {
        Self {
            name: name.into(),
            classes: Vec::new(),
            class_of: vec![None; n_indices],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn n_indices(&self) -> usize {
        self.class_of.len()
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Adds a class and returns its id.
    pub fn add_class(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        decision: D,
    ) -> usize {
        self.classes.push(ClassInfo {
            name: name.into(),
            description: description.into(),
            decision,
        });
        self.classes.len() - 1
    }

    pub fn class_info(&self, class: usize) -> Option<&ClassInfo<D>> {
        self.classes.get(class)
    }

    pub fn classes(&self) -> &[ClassInfo<D>] {
        &self.classes
    }

    /// Returns the decision of `class`.
    pub fn decision(&self, class: usize) -> Result<D> {
        self.classes
            .get(class)
            .map(|info| info.decision)
            .ok_or(CoreError::UnknownClass {
                class,
                n_classes: self.classes.len(),
            })
    }

    pub fn set_decision(&mut self, class: usize, decision: D) -> Result<()> {
        let n_classes = self.classes.len();
        let info = self
            .classes
            .get_mut(class)
            .ok_or(CoreError::UnknownClass { class, n_classes })?;
        info.decision = decision;
        Ok(())
    }

    /// Puts `index` into `class`, replacing any previous class.
    pub fn assign(&mut self, index: usize, class: usize) -> Result<()> {
        if class >= self.classes.len() {
            return Err(CoreError::UnknownClass {
                class,
                n_classes: self.classes.len(),
            });
        }
        let len = self.class_of.len();
        let slot = self.class_of.get_mut(index).ok_or(CoreError::IndexOutOfRange {
            what: "classified",
            index,
            len,
        })?;
        *slot = Some(class);
        Ok(())
    }

    /// Like [`assign`](Self::assign) for indices and classes known to be valid.
    pub(crate) fn put(&mut self, index: usize, class: usize) {
        self.class_of[index] = Some(class);
    }

    pub fn class_of(&self, index: usize) -> Option<usize> {
        self.class_of.get(index).copied().flatten()
    }

    /// Returns true if every index has a class.
    pub fn is_complete(&self) -> bool {
        self.class_of.iter().all(Option::is_some)
    }

    /// Number of indices in each class.
    pub fn class_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.classes.len()];
        for class in self.class_of.iter().flatten() {
            sizes[*class] += 1;
        }
        sizes
    }

    /// Indices of `class`, ascending.
    pub fn indices_of_class(&self, class: usize) -> Vec<usize> {
        self.class_of
            .iter()
            .enumerate()
            .filter_map(|(index, c)| (*c == Some(class)).then_some(index))
            .collect()
    }

    /// Drops classes without members and relabels the rest densely.
    pub fn remove_empty_classes(&mut self) {
        let sizes = self.class_sizes();
        let mut new_id = vec![None; self.classes.len()];
        let mut kept = Vec::with_capacity(self.classes.len());
        for (class, info) in self.classes.drain(..).enumerate() {
            if sizes[class] > 0 {
                new_id[class] = Some(kept.len());
                kept.push(info);
            }
        }
        self.classes = kept;
        for slot in &mut self.class_of {
            *slot = slot.and_then(|c| new_id[c]);
        }
    }

    /// Returns a copy with at most `max_classes` classes.
    ///
    /// The `max_classes - 1` largest classes are kept; all others are merged
    /// into one class named `merged`. Returns `None` if the classifier is
    /// already small enough or `max_classes` is zero.
    pub fn reduce_classes(&self, max_classes: usize) -> Option<Self> {
        if max_classes == 0 || self.classes.len() <= max_classes {
            return None;
        }
        let sizes = self.class_sizes();
        let mut order: Vec<usize> = (0..self.classes.len()).collect();
        order.sort_by(|&a, &b| sizes[b].cmp(&sizes[a]).then(a.cmp(&b)));

        let mut reduced = Self::new(format!("{}-reduced", self.name), self.class_of.len());
        let mut new_id = vec![0; self.classes.len()];
        for &class in order.iter().take(max_classes - 1) {
            let info = &self.classes[class];
            new_id[class] = reduced.add_class(
                info.name.clone(),
                info.description.clone(),
                info.decision,
            );
        }
        let merged = reduced.add_class("merged", "union of the smallest classes", D::default());
        for &class in order.iter().skip(max_classes - 1) {
            new_id[class] = merged;
        }
        reduced.class_of = self
            .class_of
            .iter()
            .map(|slot| slot.map(|c| new_id[c]))
            .collect();
        Some(reduced)
    }

    /// Returns true if both classifiers induce the same partition, up to
    /// class relabeling.
    pub fn is_duplicate_of(&self, other: &Self) -> bool {
        if self.class_of.len() != other.class_of.len()
            || self.classes.len() != other.classes.len()
        {
            return false;
        }
        let mut forward: Vec<Option<usize>> = vec![None; self.classes.len()];
        let mut backward: Vec<Option<usize>> = vec![None; other.classes.len()];
        for (mine, theirs) in self.class_of.iter().zip(&other.class_of) {
            match (mine, theirs) {
                (None, None) => {}
                (Some(a), Some(b)) => {
                    match (forward[*a], backward[*b]) {
                        (None, None) => {
                            forward[*a] = Some(*b);
                            backward[*b] = Some(*a);
                        }
                        (Some(fa), Some(bb)) if fa == *b && bb == *a => {}
                        _ => return false,
                    }
                }
                _ => return false,
            }
        }
        true
    }
}
