//! Classifiers derived directly from an index space.

use std::collections::BTreeMap;

use super::{ConsClassDecision, ConsClassifier, VarClassDecision, VarClassifier};
use crate::space::{ConsKind, IndexSpace, VarType};

impl ConsClassifier {
    /// One class per constraint kind present in `space`.
    pub fn by_cons_kind(space: &dyn IndexSpace) -> Self {
        let mut classifier = Self::new("constypes", space.n_conss());
        let mut class_for_kind: BTreeMap<ConsKind, usize> = BTreeMap::new();
        for cons in 0..space.n_conss() {
            let kind = space.cons_kind(cons);
            let class = *class_for_kind.entry(kind).or_insert_with(|| {
                classifier.add_class(
                    kind.name(),
                    format!("constraints of type {kind}"),
                    ConsClassDecision::BlockOrMaster,
                )
            });
            classifier.put(cons, class);
        }
        classifier
    }

    /// One class per distinct number of nonzeros in a row.
    pub fn by_nonzeros(space: &dyn IndexSpace) -> Self {
        let mut classifier = Self::new("nnonzeros", space.n_conss());
        let mut class_for_count: BTreeMap<usize, usize> = BTreeMap::new();
        for cons in 0..space.n_conss() {
            let count = space.n_vars_for_cons(cons);
            let class = *class_for_count.entry(count).or_insert_with(|| {
                classifier.add_class(
                    format!("nnz{count}"),
                    format!("constraints with {count} nonzeros"),
                    ConsClassDecision::BlockOrMaster,
                )
            });
            classifier.put(cons, class);
        }
        classifier
    }
}

impl VarClassifier {
    /// One class per variable type present in `space`.
    pub fn by_var_type(space: &dyn IndexSpace) -> Self {
        let mut classifier = Self::new("vartypes", space.n_vars());
        let mut class_for_type: Vec<(VarType, usize)> = Vec::new();
        for var in 0..space.n_vars() {
            let var_type = space.var_type(var);
            let class = match class_for_type.iter().find(|(t, _)| *t == var_type) {
                Some(&(_, class)) => class,
                None => {
                    let class = classifier.add_class(
                        var_type.to_string(),
                        format!("{var_type} variables"),
                        VarClassDecision::All,
                    );
                    class_for_type.push((var_type, class));
                    class
                }
            };
            classifier.put(var, class);
        }
        classifier
    }

    /// Splits variables into negative, zero and positive objective classes.
    pub fn by_objective_sign(space: &dyn IndexSpace) -> Self {
        let mut classifier = Self::new("objectivesigns", space.n_vars());
        let mut class_for_sign: [Option<usize>; 3] = [None; 3];
        const NAMES: [&str; 3] = ["negative", "zero", "positive"];
        for var in 0..space.n_vars() {
            let obj = space.objective(var);
            let slot = if obj < 0.0 {
                0
            } else if obj == 0.0 {
                1
            } else {
                2
            };
            let class = match class_for_sign[slot] {
                Some(class) => class,
                None => {
                    let class = classifier.add_class(
                        NAMES[slot],
                        format!("variables with {} objective coefficient", NAMES[slot]),
                        VarClassDecision::All,
                    );
                    class_for_sign[slot] = Some(class);
                    class
                }
            };
            classifier.put(var, class);
        }
        classifier
    }
}
