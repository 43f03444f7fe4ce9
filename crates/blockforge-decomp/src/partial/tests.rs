//! Tests for the assignment state.

use super::*;
use blockforge_test::{linked_pair, pattern, two_blocks};
use proptest::prelude::*;

fn assigned_cons_total(decomp: &PartialDecomposition<'_>) -> usize {
    decomp.n_open_conss()
        + decomp.n_master_conss()
        + (0..decomp.n_blocks())
            .map(|b| decomp.n_conss_for_block(b))
            .sum::<usize>()
}

fn assigned_var_total(decomp: &PartialDecomposition<'_>) -> usize {
    decomp.n_open_vars()
        + decomp.n_master_vars()
        + decomp.n_linking_vars()
        + decomp.n_total_stairlinking_vars()
        + (0..decomp.n_blocks())
            .map(|b| decomp.n_vars_for_block(b))
            .sum::<usize>()
}

// ============================================================================
// Construction and blocks
// ============================================================================

#[test]
fn test_new_is_all_open() {
    let matrix = two_blocks();
    let decomp = PartialDecomposition::new(0, &matrix);

    assert_eq!(decomp.n_blocks(), 0);
    assert_eq!(decomp.open_conss(), &[0, 1, 2, 3]);
    assert_eq!(decomp.open_vars(), &[0, 1, 2, 3]);
    assert!(decomp.is_sorted());
    assert!(!decomp.is_complete());
    assert!(decomp.check_consistency());
    assert_eq!(decomp.space_kind(), SpaceKind::Original);
}

#[test]
fn test_add_block_and_set_n_blocks() {
    let matrix = two_blocks();
    let mut decomp = PartialDecomposition::new(0, &matrix);

    assert_eq!(decomp.add_block(), 0);
    assert_eq!(decomp.add_block(), 1);
    decomp.set_n_blocks(4).unwrap();
    assert_eq!(decomp.n_blocks(), 4);
    assert!(matches!(
        decomp.set_n_blocks(2),
        Err(DecompError::InvalidState(_))
    ));
    assert_eq!(decomp.n_blocks(), 4);
}

// ============================================================================
// Booking and flushing
// ============================================================================

#[test]
fn test_flush_moves_booked_indices() {
    let matrix = two_blocks();
    let mut decomp = PartialDecomposition::new(0, &matrix);
    decomp.add_block();

    decomp.book_as_block_cons(0, 0).unwrap();
    decomp.book_as_block_cons(1, 0).unwrap();
    decomp.book_as_master_cons(2).unwrap();
    decomp.book_as_block_var(0, 0).unwrap();
    decomp.book_as_block_var(1, 0).unwrap();
    decomp.book_as_master_var(3).unwrap();
    assert_eq!(decomp.n_booked(), 6);
    // Nothing moves before the flush.
    assert_eq!(decomp.n_open_conss(), 4);

    decomp.flush_booked().unwrap();

    assert_eq!(decomp.n_booked(), 0);
    assert_eq!(decomp.open_conss(), &[3]);
    assert_eq!(decomp.open_vars(), &[2]);
    assert_eq!(decomp.conss_for_block(0), &[0, 1]);
    assert_eq!(decomp.master_conss(), &[2]);
    assert_eq!(decomp.master_vars(), &[3]);
    assert_eq!(decomp.block_of_cons(1), Some(0));
    assert_eq!(decomp.cons_assignment(2), Some(ConsAssignment::Master));
    assert_eq!(decomp.var_assignment(2), Some(VarAssignment::Open));
    assert_eq!(decomp.var_assignment(1), Some(VarAssignment::Block(0)));
}

#[test]
fn test_flush_without_bookings_is_noop() {
    let matrix = two_blocks();
    let mut decomp = PartialDecomposition::new(0, &matrix);
    let generation = decomp.generation();

    decomp.flush_booked().unwrap();
    decomp.flush_booked().unwrap();

    assert_eq!(decomp.generation(), generation);
    assert_eq!(decomp.n_open_conss(), 4);
}

#[test]
fn test_flush_rejects_duplicates_atomically() {
    let matrix = two_blocks();
    let mut decomp = PartialDecomposition::new(0, &matrix);
    decomp.add_block();

    decomp.book_as_master_cons(0).unwrap();
    decomp.book_as_block_cons(1, 0).unwrap();
    decomp.book_as_block_cons(0, 0).unwrap();

    let err = decomp.flush_booked().unwrap_err();
    assert!(matches!(err, DecompError::InvalidState(_)));
    assert_eq!(decomp.n_open_conss(), 4);
    assert_eq!(decomp.n_master_conss(), 0);
    assert_eq!(decomp.n_conss_for_block(0), 0);
    assert_eq!(decomp.n_booked(), 0);
}

#[test]
fn test_booking_errors() {
    let matrix = two_blocks();
    let mut decomp = PartialDecomposition::new(0, &matrix);
    decomp.add_block();

    assert!(matches!(
        decomp.book_as_master_cons(9),
        Err(DecompError::IndexOutOfRange { what: "constraint", .. })
    ));
    assert!(matches!(
        decomp.book_as_block_var(0, 1),
        Err(DecompError::BlockOutOfRange { block: 1, n_blocks: 1 })
    ));
    // Only one block, so there is no successor to link to.
    assert!(decomp.book_as_stairlinking_var(0, 0).is_err());

    decomp.book_as_master_cons(0).unwrap();
    decomp.flush_booked().unwrap();
    assert!(matches!(
        decomp.book_as_master_cons(0),
        Err(DecompError::NotOpen { index: 0, .. })
    ));
}

#[test]
fn test_clear_booked() {
    let matrix = two_blocks();
    let mut decomp = PartialDecomposition::new(0, &matrix);
    decomp.book_as_master_cons(0).unwrap();
    decomp.clear_booked();
    decomp.flush_booked().unwrap();
    assert_eq!(decomp.n_master_conss(), 0);
}

// ============================================================================
// Direct assignment
// ============================================================================

#[test]
fn test_set_then_delete_open() {
    let matrix = two_blocks();
    let mut decomp = PartialDecomposition::new(0, &matrix);
    decomp.add_block();

    decomp.set_cons_to_block(0, 0).unwrap();
    assert!(decomp.is_cons_open(0));
    decomp.delete_open_cons(0).unwrap();
    assert!(!decomp.is_cons_open(0));
    assert!(decomp.is_cons_block_cons_of(0, 0));

    decomp.set_var_to_linking(1).unwrap();
    decomp.delete_open_var(1).unwrap();
    assert!(decomp.is_var_linking(1));
    assert!(matches!(
        decomp.delete_open_var(1),
        Err(DecompError::NotOpen { .. })
    ));
    assert!(decomp.set_var_to_master(1).is_err());
}

#[test]
fn test_deleted_but_unset_index_has_no_assignment() {
    let matrix = two_blocks();
    let mut decomp = PartialDecomposition::new(0, &matrix);
    decomp.delete_open_cons(3).unwrap();

    assert_eq!(decomp.cons_assignment(3), None);
    assert!(!decomp.check_consistency());
}

#[test]
fn test_set_var_to_stairlinking_requires_consecutive_blocks() {
    let matrix = two_blocks();
    let mut decomp = PartialDecomposition::new(0, &matrix);
    decomp.set_n_blocks(3).unwrap();

    assert!(decomp.set_var_to_stairlinking(0, 0, 2).is_err());
    decomp.set_var_to_stairlinking(0, 1, 2).unwrap();
    assert!(decomp.is_var_stairlinking_of(0, 1));
    assert!(decomp.is_var_stairlinking_of(0, 2));
    assert!(!decomp.is_var_stairlinking_of(0, 0));
}

// ============================================================================
// Block deletion and relabeling
// ============================================================================

#[test]
fn test_delete_empty_blocks_removes_all_fresh_blocks() {
    let matrix = two_blocks();
    let mut decomp = PartialDecomposition::new(0, &matrix);
    decomp.add_block();
    decomp.add_block();
    decomp.add_block();

    assert_eq!(decomp.delete_empty_blocks(false).unwrap(), 3);
    assert_eq!(decomp.n_blocks(), 0);
}

#[test]
fn test_delete_empty_blocks_relabels_and_reopens() {
    let matrix = two_blocks();
    let mut decomp = PartialDecomposition::new(0, &matrix);
    decomp.set_n_blocks(3).unwrap();
    decomp.book_as_block_cons(0, 0).unwrap();
    decomp.book_as_block_cons(2, 2).unwrap();
    decomp.book_as_block_var(2, 2).unwrap();
    decomp.book_as_block_var(1, 1).unwrap();
    decomp.flush_booked().unwrap();

    assert_eq!(decomp.delete_empty_blocks(false).unwrap(), 1);

    assert_eq!(decomp.n_blocks(), 2);
    assert_eq!(decomp.conss_for_block(1), &[2]);
    assert_eq!(decomp.block_of_var(2), Some(1));
    // x1 sat in the deleted block and is open again.
    assert!(decomp.is_var_open(1));
    assert_eq!(assigned_var_total(&decomp), 4);
}

#[test]
fn test_delete_empty_blocks_counting_vars() {
    let matrix = two_blocks();
    let mut decomp = PartialDecomposition::new(0, &matrix);
    decomp.set_n_blocks(2).unwrap();
    decomp.book_as_block_var(1, 1).unwrap();
    decomp.flush_booked().unwrap();

    assert_eq!(decomp.delete_empty_blocks(true).unwrap(), 1);
    assert_eq!(decomp.n_blocks(), 1);
    assert_eq!(decomp.vars_for_block(0), &[1]);
}

#[test]
fn test_delete_empty_blocks_rejects_pending_bookings() {
    let matrix = two_blocks();
    let mut decomp = PartialDecomposition::new(0, &matrix);
    decomp.add_block();
    decomp.book_as_block_cons(0, 0).unwrap();

    assert!(matches!(
        decomp.delete_empty_blocks(false),
        Err(DecompError::InvalidState(_))
    ));
    assert_eq!(decomp.n_blocks(), 1);
}

#[test]
fn test_change_block_order() {
    let matrix = two_blocks();
    let mut decomp = PartialDecomposition::new(0, &matrix);
    decomp.set_n_blocks(2).unwrap();
    decomp.book_as_block_cons(0, 0).unwrap();
    decomp.book_as_block_cons(2, 1).unwrap();
    decomp.flush_booked().unwrap();

    decomp.change_block_order(&[1, 0]).unwrap();

    assert_eq!(decomp.block_of_cons(0), Some(1));
    assert_eq!(decomp.block_of_cons(2), Some(0));
    assert!(decomp.change_block_order(&[0, 0]).is_err());
    assert!(decomp.change_block_order(&[0]).is_err());
}

#[test]
fn test_change_block_order_breaks_stairlinking() {
    let matrix = pattern(3, &[&[0, 2], &[1, 2], &[2]]);
    let mut decomp = PartialDecomposition::new(0, &matrix);
    decomp.set_n_blocks(3).unwrap();
    for block in 0..3 {
        decomp.book_as_block_cons(block, block).unwrap();
    }
    decomp.book_as_stairlinking_var(0, 0).unwrap();
    decomp.flush_booked().unwrap();

    // Blocks 0 and 1 end up at positions 2 and 0.
    decomp.change_block_order(&[2, 0, 1]).unwrap();

    assert!(decomp.is_var_linking(0));
    assert_eq!(decomp.n_total_stairlinking_vars(), 0);
}

#[test]
fn test_sort_keeps_generation() {
    let matrix = two_blocks();
    let mut decomp = PartialDecomposition::new(0, &matrix);
    decomp.book_as_master_cons(3).unwrap();
    decomp.book_as_master_cons(1).unwrap();
    decomp.flush_booked().unwrap();
    assert!(!decomp.is_sorted());

    let generation = decomp.generation();
    decomp.sort();
    assert!(decomp.is_sorted());
    assert_eq!(decomp.master_conss(), &[1, 3]);
    assert_eq!(decomp.generation(), generation);
}

// ============================================================================
// Consistency
// ============================================================================

#[test]
fn test_consistency_flags_empty_block() {
    let matrix = two_blocks();
    let mut decomp = PartialDecomposition::new(0, &matrix);
    decomp.add_block();

    let violations = decomp.consistency_violations();
    assert_eq!(violations, vec!["block 0 has no constraints".to_string()]);
}

#[test]
fn test_consistency_flags_master_var_in_block_cons() {
    let matrix = two_blocks();
    let mut decomp = PartialDecomposition::new(0, &matrix);
    decomp.add_block();
    decomp.book_as_block_cons(1, 0).unwrap();
    decomp.book_as_master_var(1).unwrap();
    decomp.flush_booked().unwrap();

    assert!(!decomp.check_consistency());
    assert!(decomp
        .consistency_violations()
        .iter()
        .any(|v| v.contains("master variable 1")));
}

#[test]
fn test_consistency_flags_single_block_linking_var() {
    let matrix = linked_pair();
    let mut decomp = PartialDecomposition::new(0, &matrix);
    decomp.add_block();
    decomp.book_as_block_cons(0, 0).unwrap();
    decomp.book_as_block_cons(2, 0).unwrap();
    decomp.book_as_linking_var(0).unwrap();
    decomp.flush_booked().unwrap();

    assert!(decomp
        .consistency_violations()
        .iter()
        .any(|v| v.contains("linking variable 0")));
}

#[test]
fn test_consistency_flags_unsorted_claim() {
    let matrix = two_blocks();
    let mut decomp = PartialDecomposition::new(0, &matrix);
    decomp.book_as_master_cons(3).unwrap();
    decomp.book_as_master_cons(1).unwrap();
    decomp.flush_booked().unwrap();
    decomp.sorted = true;

    assert!(decomp
        .consistency_violations()
        .iter()
        .any(|v| v.contains("unsorted")));
}

// ============================================================================
// Copies
// ============================================================================

#[test]
fn test_derived_copy_is_independent() {
    let matrix = two_blocks();
    let mut parent = PartialDecomposition::new(4, &matrix);
    parent.book_as_master_cons(0).unwrap();
    parent.flush_booked().unwrap();

    let mut child = parent.derive(5);
    child.book_as_master_cons(1).unwrap();
    child.flush_booked().unwrap();

    assert_eq!(child.id(), 5);
    assert_eq!(child.lineage().ancestors(), &[4]);
    assert_eq!(parent.master_conss(), &[0]);
    assert_eq!(child.n_master_conss(), 2);
    assert!(parent.lineage().ancestors().is_empty());
}

#[test]
fn test_display_summarizes_blocks() {
    let matrix = two_blocks();
    let mut decomp = PartialDecomposition::new(2, &matrix);
    decomp.complete_by_connected().unwrap();

    let text = decomp.to_string();
    assert!(text.starts_with("decomposition 2"));
    assert!(text.contains("block 1: 2 conss, 2 vars"));
    assert!(text.contains("open: 0 conss, 0 vars"));
}

// ============================================================================
// Properties
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    AddBlock,
    BookMasterCons(usize),
    BookBlockCons(usize, usize),
    BookMasterVar(usize),
    BookBlockVar(usize, usize),
    BookLinkingVar(usize),
    Flush,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::AddBlock),
        (0..6usize).prop_map(Op::BookMasterCons),
        (0..6usize, 0..3usize).prop_map(|(c, b)| Op::BookBlockCons(c, b)),
        (0..6usize).prop_map(Op::BookMasterVar),
        (0..6usize, 0..3usize).prop_map(|(v, b)| Op::BookBlockVar(v, b)),
        (0..6usize).prop_map(Op::BookLinkingVar),
        Just(Op::Flush),
    ]
}

proptest! {
    #[test]
    fn prop_every_index_has_exactly_one_place(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let matrix = pattern(6, &[&[0, 1], &[1, 2], &[2, 3], &[3, 4], &[4, 5], &[5, 0]]);
        let mut decomp = PartialDecomposition::new(0, &matrix);
        for op in ops {
            // Errors are allowed; they must not break the partition.
            let _ = match op {
                Op::AddBlock => {
                    decomp.add_block();
                    Ok(())
                }
                Op::BookMasterCons(c) => decomp.book_as_master_cons(c),
                Op::BookBlockCons(c, b) => decomp.book_as_block_cons(c, b),
                Op::BookMasterVar(v) => decomp.book_as_master_var(v),
                Op::BookBlockVar(v, b) => decomp.book_as_block_var(v, b),
                Op::BookLinkingVar(v) => decomp.book_as_linking_var(v),
                Op::Flush => decomp.flush_booked(),
            };
            prop_assert_eq!(assigned_cons_total(&decomp), 6);
            prop_assert_eq!(assigned_var_total(&decomp), 6);
            for index in 0..6 {
                prop_assert!(decomp.cons_assignment(index).is_some());
                prop_assert!(decomp.var_assignment(index).is_some());
            }
        }
    }

    #[test]
    fn prop_flush_is_idempotent(ops in prop::collection::vec(op_strategy(), 0..20)) {
        let matrix = pattern(6, &[&[0, 1], &[1, 2], &[2, 3], &[3, 4], &[4, 5], &[5, 0]]);
        let mut decomp = PartialDecomposition::new(0, &matrix);
        decomp.set_n_blocks(3).unwrap();
        for op in ops {
            let _ = match op {
                Op::BookMasterCons(c) => decomp.book_as_master_cons(c),
                Op::BookBlockCons(c, b) => decomp.book_as_block_cons(c, b),
                Op::BookMasterVar(v) => decomp.book_as_master_var(v),
                Op::BookBlockVar(v, b) => decomp.book_as_block_var(v, b),
                Op::BookLinkingVar(v) => decomp.book_as_linking_var(v),
                Op::AddBlock | Op::Flush => Ok(()),
            };
        }
        let _ = decomp.flush_booked();
        let snapshot = decomp.clone();
        decomp.flush_booked().unwrap();
        prop_assert!(decomp.is_equal(&snapshot, true));
        prop_assert_eq!(decomp.generation(), snapshot.generation());
    }
}
