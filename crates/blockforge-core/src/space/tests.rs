//! Tests for index spaces.

use super::*;

fn small_matrix() -> ConstraintMatrix {
    let mut builder = MatrixBuilder::new();
    let x = builder.add_binary("x").unwrap();
    let y = builder.add_binary("y").unwrap();
    let z = builder
        .add_var("z", VarType::Continuous, 0.0, 10.0, -2.5)
        .unwrap();
    builder
        .add_cons("part", &[(x, 1.0), (y, 1.0)], 1.0, 1.0)
        .unwrap();
    builder
        .add_cons("mixed", &[(z, 3.0), (x, 2.0)], f64::NEG_INFINITY, 4.0)
        .unwrap();
    builder.build()
}

#[test]
fn test_dimensions() {
    let m = small_matrix();
    assert_eq!(m.n_conss(), 2);
    assert_eq!(m.n_vars(), 3);
    assert_eq!(m.n_nonzeros(), 4);
    assert_eq!(m.kind(), SpaceKind::Original);
}

#[test]
fn test_row_and_column_adjacency() {
    let m = small_matrix();
    assert_eq!(m.vars_for_cons(0), &[0, 1]);
    assert_eq!(m.vars_for_cons(1), &[0, 2]);
    assert_eq!(m.vals_for_cons(1), &[2.0, 3.0]);
    assert_eq!(m.conss_for_var(0), &[0, 1]);
    assert_eq!(m.conss_for_var(1), &[0]);
    assert_eq!(m.conss_for_var(2), &[1]);
}

#[test]
fn test_coefficient_lookup() {
    let m = small_matrix();
    assert_eq!(m.coefficient(1, 2), 3.0);
    assert_eq!(m.coefficient(0, 2), 0.0);
}

#[test]
fn test_cons_kinds() {
    let m = small_matrix();
    assert_eq!(m.cons_kind(0), ConsKind::SetPartitioning);
    assert_eq!(m.cons_kind(1), ConsKind::Linear);
    assert!(m.cons_kind(0).is_setppc_or_cardinality());
}

#[test]
fn test_more_cons_kinds() {
    let mut b = MatrixBuilder::new();
    let vars: Vec<usize> = (0..3).map(|i| b.add_binary(format!("b{i}")).unwrap()).collect();
    let unit: Vec<(usize, f64)> = vars.iter().map(|&v| (v, 1.0)).collect();
    b.add_cons("pack", &unit, f64::NEG_INFINITY, 1.0).unwrap();
    b.add_cons("cover", &unit, 1.0, f64::INFINITY).unwrap();
    b.add_cons("card", &unit, 2.0, 2.0).unwrap();
    b.add_cons("knap", &[(0, 3.0), (1, 5.0)], f64::NEG_INFINITY, 6.0)
        .unwrap();
    let m = b.build();
    assert_eq!(m.cons_kind(0), ConsKind::SetPacking);
    assert_eq!(m.cons_kind(1), ConsKind::SetCovering);
    assert_eq!(m.cons_kind(2), ConsKind::Cardinality);
    assert_eq!(m.cons_kind(3), ConsKind::Knapsack);
}

#[test]
fn test_duplicate_entries_merge() {
    let mut b = MatrixBuilder::new();
    let x = b.add_binary("x").unwrap();
    let y = b.add_binary("y").unwrap();
    b.add_cons("c", &[(x, 1.0), (y, 2.0), (x, 1.0), (y, -2.0)], 0.0, 5.0)
        .unwrap();
    let m = b.build();
    assert_eq!(m.vars_for_cons(0), &[0]);
    assert_eq!(m.vals_for_cons(0), &[2.0]);
    assert!(m.conss_for_var(1).is_empty());
}

#[test]
fn test_builder_errors() {
    let mut b = MatrixBuilder::new();
    b.add_binary("x").unwrap();
    assert!(matches!(
        b.add_binary("x"),
        Err(crate::CoreError::DuplicateName { .. })
    ));
    assert!(matches!(
        b.add_cons("c", &[(7, 1.0)], 0.0, 1.0),
        Err(crate::CoreError::IndexOutOfRange { index: 7, .. })
    ));
    assert!(matches!(
        b.add_cons("bad", &[(0, 1.0)], 2.0, 1.0),
        Err(crate::CoreError::InvalidMatrix(_))
    ));
}

#[test]
fn test_from_pattern_and_names() {
    let m = ConstraintMatrix::from_pattern(4, &[&[0, 1], &[2, 3]]).unwrap();
    assert_eq!(m.n_conss(), 2);
    assert_eq!(m.cons_name(1), "c1");
    assert_eq!(m.var_name(3), "x3");
    assert_eq!(m.cons_index("c1"), Some(1));
    assert_eq!(m.var_index("x9"), None);
    assert_eq!(m.cons_kind(0), ConsKind::SetPacking);
}

#[test]
fn test_presolved_kind() {
    let m = MatrixBuilder::new().presolved().build();
    assert!(m.kind().is_presolved());
    assert_eq!(m.n_conss(), 0);
    assert_eq!(m.n_nonzeros(), 0);
}
