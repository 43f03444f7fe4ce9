//! Tests for the reference detectors.

use super::*;
use crate::detector::IdSource;
use blockforge_config::ConsClassDetectorConfig;
use blockforge_core::{ConsClassDecision, ConsClassifier};
use blockforge_decomp::PartialDecomposition;
use blockforge_test::{bin_packing, two_blocks};

fn last_classifier<'d>(decomp: &'d PartialDecomposition<'_>) -> Option<&'d str> {
    decomp
        .lineage()
        .steps()
        .last()
        .and_then(|step| step.used_classifier.as_deref())
}

// ============================================================================
// Connected
// ============================================================================

#[test]
fn test_connected_completes_successor() {
    let matrix = two_blocks();
    let root = PartialDecomposition::new(0, &matrix);
    let ids = IdSource::starting_at(1);

    let successors = ConnectedDetector.propagate(&root, &ids).unwrap();

    assert_eq!(successors.len(), 1);
    let child = &successors[0];
    assert_eq!(child.id(), 1);
    assert!(child.is_complete());
    assert_eq!(child.n_blocks(), 2);
    assert_eq!(child.lineage().ancestors(), &[0]);
    assert_eq!(child.lineage().detector_chain_string(), "C");
    assert!(root.open_conss().len() == 4, "input stays untouched");
}

#[test]
fn test_connected_skips_complete_input() {
    let matrix = two_blocks();
    let mut done = PartialDecomposition::new(0, &matrix);
    done.complete_by_connected().unwrap();
    let ids = IdSource::new();

    assert!(ConnectedDetector.propagate(&done, &ids).unwrap().is_empty());
    assert!(ConnectedDetector.finish(&done, &ids).unwrap().is_none());
}

#[test]
fn test_connected_finishes() {
    let matrix = two_blocks();
    let root = PartialDecomposition::new(0, &matrix);

    let finished = ConnectedDetector.finish(&root, &IdSource::new()).unwrap();

    assert!(finished.is_some_and(|d| d.is_complete()));
}

// ============================================================================
// Constraint classes
// ============================================================================

#[test]
fn test_cons_class_branches_per_class() {
    let matrix = bin_packing(2, 3);
    let root = PartialDecomposition::new(0, &matrix);
    let detector = ConsClassDetector::default();

    let successors = detector.propagate(&root, &IdSource::starting_at(1)).unwrap();

    // Row length splits the rows like the constraint kind does, so only
    // one classifier survives.
    assert_eq!(successors.len(), 2);
    assert_eq!(successors[0].master_conss(), &[0, 1]);
    assert_eq!(successors[1].master_conss(), &[2, 3, 4]);
    for child in &successors {
        assert_eq!(last_classifier(child), Some("constypes"));
        assert_eq!(child.lineage().detector_chain_string(), "c");
        assert_eq!(child.n_blocks(), 0);
    }
}

#[test]
fn test_cons_class_honors_only_master() {
    let matrix = two_blocks();
    let mut classifier = ConsClassifier::new("custom", 4);
    let forced = classifier.add_class("a", "forced", ConsClassDecision::OnlyMaster);
    let b = classifier.add_class("b", "free", ConsClassDecision::BlockOrMaster);
    let c = classifier.add_class("c", "free", ConsClassDecision::BlockOrMaster);
    for (cons, class) in [(0, forced), (1, b), (2, c), (3, c)] {
        classifier.assign(cons, class).unwrap();
    }
    let detector = ConsClassDetector::default().with_classifier(classifier);
    let root = PartialDecomposition::new(0, &matrix);

    let successors = detector.propagate(&root, &IdSource::new()).unwrap();

    let masters: Vec<&[usize]> = successors.iter().map(|d| d.master_conss()).collect();
    let expected: Vec<&[usize]> = vec![&[0], &[0, 1], &[0, 2, 3]];
    assert_eq!(masters, expected);
    assert!(successors.iter().all(|d| last_classifier(d) == Some("custom")));
}

#[test]
fn test_cons_class_reduces_classes() {
    let matrix = two_blocks();
    let mut classifier = ConsClassifier::new("fine", 4);
    for cons in 0..4 {
        let class = classifier.add_class(format!("k{cons}"), "", ConsClassDecision::BlockOrMaster);
        classifier.assign(cons, class).unwrap();
    }
    let config = ConsClassDetectorConfig { max_classes: 2 };
    let detector = ConsClassDetector::new(config).with_classifier(classifier);
    let root = PartialDecomposition::new(0, &matrix);

    let successors = detector.propagate(&root, &IdSource::new()).unwrap();

    // One kept class and one merged class of three rows.
    assert_eq!(successors.len(), 2);
    assert_eq!(successors[0].n_master_conss(), 1);
    assert_eq!(successors[1].n_master_conss(), 3);
    assert_eq!(last_classifier(&successors[0]), Some("fine-reduced"));
}

#[test]
fn test_cons_class_skips_classifier_with_one_class() {
    // Every row of two independent 2x2 blocks has kind set packing, but the
    // row lengths differ.
    let matrix = two_blocks();
    let root = PartialDecomposition::new(0, &matrix);

    let successors = ConsClassDetector::default()
        .propagate(&root, &IdSource::new())
        .unwrap();

    assert_eq!(successors.len(), 2);
    assert!(successors.iter().all(|d| last_classifier(d) == Some("nnonzeros")));
}

#[test]
fn test_cons_class_ignores_assigned_input() {
    let matrix = bin_packing(2, 3);
    let mut seeded = PartialDecomposition::new(0, &matrix);
    seeded.book_as_master_cons(4).unwrap();
    seeded.flush_booked().unwrap();

    let successors = ConsClassDetector::default()
        .propagate(&seeded, &IdSource::new())
        .unwrap();

    assert!(successors.is_empty());
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_build_detectors_default_chain() {
    let detectors = build_detectors(&[]);
    let names: Vec<&str> = detectors.iter().map(|d| d.name()).collect();

    assert_eq!(names, vec!["consclass", "connected"]);
}

#[test]
fn test_build_detectors_follows_config() {
    let configs = [
        DetectorConfig::Connected,
        DetectorConfig::ConsClass(ConsClassDetectorConfig::default()),
    ];
    let detectors = build_detectors(&configs);
    let chars: String = detectors.iter().map(|d| d.chain_char()).collect();

    assert_eq!(chars, "Cc");
}
