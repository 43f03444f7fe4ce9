//! Tests for classifiers.

use super::*;
use crate::space::{ConstraintMatrix, MatrixBuilder, VarType};

fn three_class_classifier() -> ConsClassifier {
    let mut c = ConsClassifier::new("test", 6);
    let a = c.add_class("a", "first", ConsClassDecision::BlockOrMaster);
    let b = c.add_class("b", "second", ConsClassDecision::OnlyMaster);
    let d = c.add_class("d", "third", ConsClassDecision::BlockOrMaster);
    for index in 0..3 {
        c.assign(index, a).unwrap();
    }
    c.assign(3, b).unwrap();
    c.assign(4, b).unwrap();
    c.assign(5, d).unwrap();
    c
}

#[test]
fn test_assign_and_query() {
    let c = three_class_classifier();
    assert_eq!(c.n_classes(), 3);
    assert_eq!(c.n_indices(), 6);
    assert!(c.is_complete());
    assert_eq!(c.class_of(4), Some(1));
    assert_eq!(c.class_sizes(), vec![3, 2, 1]);
    assert_eq!(c.indices_of_class(1), vec![3, 4]);
    assert_eq!(c.decision(1).unwrap(), ConsClassDecision::OnlyMaster);
}

#[test]
fn test_assign_errors() {
    let mut c = three_class_classifier();
    assert!(matches!(
        c.assign(0, 9),
        Err(CoreError::UnknownClass { class: 9, .. })
    ));
    assert!(matches!(
        c.assign(17, 0),
        Err(CoreError::IndexOutOfRange { index: 17, .. })
    ));
    assert!(c.set_decision(5, ConsClassDecision::OnlyMaster).is_err());
}

#[test]
fn test_incomplete_classifier() {
    let mut v = VarClassifier::new("partial", 3);
    let only = v.add_class("only", "", VarClassDecision::Linking);
    v.assign(0, only).unwrap();
    assert!(!v.is_complete());
    assert_eq!(v.class_of(2), None);
    assert_eq!(v.class_sizes(), vec![1]);
}

#[test]
fn test_remove_empty_classes() {
    let mut c = ConsClassifier::new("sparse", 2);
    let _unused = c.add_class("unused", "", ConsClassDecision::BlockOrMaster);
    let used = c.add_class("used", "", ConsClassDecision::OnlyMaster);
    c.assign(0, used).unwrap();
    c.assign(1, used).unwrap();
    c.remove_empty_classes();
    assert_eq!(c.n_classes(), 1);
    assert_eq!(c.class_of(1), Some(0));
    assert_eq!(c.class_info(0).unwrap().name, "used");
}

#[test]
fn test_reduce_classes() {
    let c = three_class_classifier();
    assert!(c.reduce_classes(3).is_none());
    assert!(c.reduce_classes(0).is_none());

    let reduced = c.reduce_classes(2).unwrap();
    assert_eq!(reduced.n_classes(), 2);
    assert_eq!(reduced.class_info(0).unwrap().name, "a");
    assert_eq!(reduced.class_info(1).unwrap().name, "merged");
    assert_eq!(reduced.class_sizes(), vec![3, 3]);
    assert_eq!(reduced.class_of(5), Some(1));
    assert_eq!(
        reduced.decision(1).unwrap(),
        ConsClassDecision::BlockOrMaster
    );
}

#[test]
fn test_duplicate_detection() {
    let c = three_class_classifier();
    let mut relabeled = ConsClassifier::new("relabeled", 6);
    let x = relabeled.add_class("x", "", ConsClassDecision::BlockOrMaster);
    let y = relabeled.add_class("y", "", ConsClassDecision::BlockOrMaster);
    let z = relabeled.add_class("z", "", ConsClassDecision::BlockOrMaster);
    for index in 0..3 {
        relabeled.assign(index, z).unwrap();
    }
    relabeled.assign(3, x).unwrap();
    relabeled.assign(4, x).unwrap();
    relabeled.assign(5, y).unwrap();
    assert!(c.is_duplicate_of(&relabeled));

    relabeled.assign(5, x).unwrap();
    assert!(!c.is_duplicate_of(&relabeled));
}

#[test]
fn test_by_cons_kind() {
    let mut b = MatrixBuilder::new();
    for i in 0..3 {
        b.add_binary(format!("x{i}")).unwrap();
    }
    b.add_cons("p", &[(0, 1.0), (1, 1.0)], 1.0, 1.0).unwrap();
    b.add_cons("q", &[(1, 1.0), (2, 1.0)], 1.0, 1.0).unwrap();
    b.add_cons("l", &[(0, 2.5), (2, -1.0)], 0.0, 3.0).unwrap();
    let m = b.build();

    let c = ConsClassifier::by_cons_kind(&m);
    assert_eq!(c.n_classes(), 2);
    assert_eq!(c.class_of(0), c.class_of(1));
    assert_ne!(c.class_of(0), c.class_of(2));
    assert_eq!(c.class_info(0).unwrap().name, "setpartitioning");
}

#[test]
fn test_by_nonzeros() {
    let m = ConstraintMatrix::from_pattern(4, &[&[0, 1], &[2, 3], &[0, 1, 2]]).unwrap();
    let c = ConsClassifier::by_nonzeros(&m);
    assert_eq!(c.n_classes(), 2);
    assert_eq!(c.class_sizes(), vec![2, 1]);
}

#[test]
fn test_var_classifiers() {
    let mut b = MatrixBuilder::new();
    b.add_var("a", VarType::Binary, 0.0, 1.0, -1.0).unwrap();
    b.add_var("b", VarType::Continuous, 0.0, 5.0, 0.0).unwrap();
    b.add_var("c", VarType::Binary, 0.0, 1.0, 2.0).unwrap();
    let m = b.build();

    let types = VarClassifier::by_var_type(&m);
    assert_eq!(types.n_classes(), 2);
    assert_eq!(types.class_of(0), types.class_of(2));

    let signs = VarClassifier::by_objective_sign(&m);
    assert_eq!(signs.n_classes(), 3);
    assert_eq!(signs.class_info(signs.class_of(1).unwrap()).unwrap().name, "zero");
}
