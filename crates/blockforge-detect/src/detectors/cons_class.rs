//! Constraint-class detector.

use std::collections::HashSet;

use blockforge_config::ConsClassDetectorConfig;
use blockforge_core::{ConsClassDecision, ConsClassifier, IndexSpace};
use blockforge_decomp::PartialDecomposition;
use tracing::debug;

use crate::detector::{successor, Detector, IdSource};
use crate::error::Result;

/// Sends classes of constraints to the master problem.
///
/// For every classifier with at least two classes, each `BlockOrMaster`
/// class yields one successor whose master holds that class together with
/// every `OnlyMaster` class. If the classifier has `OnlyMaster` classes, one
/// more successor holds just those. Only open constraints move. A selection
/// that would move no open constraint, or every open constraint, is skipped.
///
/// Runs only on decompositions without block or master constraints.
#[derive(Debug, Clone, Default)]
pub struct ConsClassDetector {
    config: ConsClassDetectorConfig,
    classifiers: Vec<ConsClassifier>,
}

impl ConsClassDetector {
    pub fn new(config: ConsClassDetectorConfig) -> Self {
        Self {
            config,
            classifiers: Vec::new(),
        }
    }

    /// Uses `classifier` instead of the built-in ones.
    ///
    /// Once any classifier is added, the built-in classifiers by constraint
    /// kind and by row length are no longer consulted.
    pub fn with_classifier(mut self, classifier: ConsClassifier) -> Self {
        self.classifiers.push(classifier);
        self
    }

    fn classifiers_for(&self, space: &dyn IndexSpace) -> Vec<ConsClassifier> {
        let base = if self.classifiers.is_empty() {
            vec![
                ConsClassifier::by_cons_kind(space),
                ConsClassifier::by_nonzeros(space),
            ]
        } else {
            self.classifiers.clone()
        };
        let mut kept: Vec<ConsClassifier> = Vec::with_capacity(base.len());
        for classifier in base {
            let classifier = classifier
                .reduce_classes(self.config.max_classes)
                .unwrap_or(classifier);
            if classifier.n_classes() < 2 || kept.iter().any(|k| k.is_duplicate_of(&classifier)) {
                continue;
            }
            kept.push(classifier);
        }
        kept
    }
}

/// Class sets to send to the master, one per successor.
fn master_selections(classifier: &ConsClassifier) -> Vec<Vec<usize>> {
    let (forced, free): (Vec<usize>, Vec<usize>) = (0..classifier.n_classes())
        .partition(|&class| {
            classifier.decision(class).ok() == Some(ConsClassDecision::OnlyMaster)
        });
    let mut selections = Vec::with_capacity(free.len() + 1);
    if !forced.is_empty() {
        selections.push(forced.clone());
    }
    for class in free {
        let mut selection = forced.clone();
        selection.push(class);
        selections.push(selection);
    }
    selections
}

impl Detector for ConsClassDetector {
    fn name(&self) -> &str {
        "consclass"
    }

    fn chain_char(&self) -> char {
        'c'
    }

    fn propagate<'a>(
        &self,
        decomp: &PartialDecomposition<'a>,
        ids: &IdSource,
    ) -> Result<Vec<PartialDecomposition<'a>>> {
        if decomp.already_assigned_conss_to_blocks() || decomp.n_master_conss() > 0 {
            return Ok(Vec::new());
        }
        let open = decomp.open_conss();
        let mut successors = Vec::new();
        for classifier in self.classifiers_for(decomp.space()) {
            for selection in master_selections(&classifier) {
                let selected: HashSet<usize> = selection.into_iter().collect();
                let to_master: Vec<usize> = open
                    .iter()
                    .copied()
                    .filter(|&cons| {
                        classifier
                            .class_of(cons)
                            .is_some_and(|class| selected.contains(&class))
                    })
                    .collect();
                if to_master.is_empty() || to_master.len() == open.len() {
                    continue;
                }
                let mut child = successor(self, decomp, ids);
                for &cons in &to_master {
                    child.book_as_master_cons(cons)?;
                }
                child.flush_booked()?;
                child.lineage_mut().add_used_classifier(classifier.name());
                successors.push(child);
            }
        }
        debug!(
            parent = decomp.id(),
            successors = successors.len(),
            "constraint classes sent to master"
        );
        Ok(successors)
    }
}
