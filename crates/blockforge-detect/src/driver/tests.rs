//! Tests for the detection loop.

use super::*;
use crate::error::DetectError;
use crate::termination::CandidateCountTermination;
use blockforge_config::ThreadCount;
use blockforge_core::ConstraintMatrix;
use blockforge_test::{bin_packing, pattern, two_blocks};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn run(matrix: &ConstraintMatrix, config: DetectionConfig) -> DetectionResult<'_> {
    DetectionLoop::new(matrix, config).run().unwrap()
}

fn sequential() -> DetectionConfig {
    let mut config = DetectionConfig::default();
    config.detection.threads = ThreadCount::None;
    config
}

/// Does nothing; leaves finishing to the fallback.
#[derive(Debug)]
struct Idle;

impl Detector for Idle {
    fn name(&self) -> &str {
        "idle"
    }

    fn chain_char(&self) -> char {
        'i'
    }

    fn propagate<'a>(
        &self,
        _decomp: &PartialDecomposition<'a>,
        _ids: &IdSource,
    ) -> crate::error::Result<Vec<PartialDecomposition<'a>>> {
        Ok(Vec::new())
    }
}

/// Proposes the same master constraint twice for an empty master.
#[derive(Debug)]
struct Twice;

impl Detector for Twice {
    fn name(&self) -> &str {
        "twice"
    }

    fn chain_char(&self) -> char {
        't'
    }

    fn propagate<'a>(
        &self,
        decomp: &PartialDecomposition<'a>,
        ids: &IdSource,
    ) -> crate::error::Result<Vec<PartialDecomposition<'a>>> {
        if decomp.n_master_conss() > 0 {
            return Ok(Vec::new());
        }
        let mut successors = Vec::new();
        for _ in 0..2 {
            let mut child = crate::detector::successor(self, decomp, ids);
            child.book_as_master_cons(0)?;
            child.flush_booked()?;
            successors.push(child);
        }
        Ok(successors)
    }
}

// ============================================================================
// Results
// ============================================================================

#[test]
fn test_two_blocks_best_is_connected() {
    let matrix = two_blocks();
    let result = run(&matrix, DetectionConfig::default());

    let best = result.best().unwrap();
    assert!(best.is_complete());
    assert_eq!(best.n_blocks(), 2);
    assert_eq!(best.n_master_conss(), 0);
    assert!((best.calc_score(result.score_type()) - 0.5).abs() < 1e-9);
    assert!(result.stats().rounds >= 1);
    assert!(!result.terminated_early());
}

#[test]
fn test_candidates_are_ranked_and_distinct() {
    let matrix = bin_packing(3, 2);
    let result = run(&matrix, sequential());
    let candidates = result.candidates();
    let score_type = result.score_type();

    assert!(candidates.len() >= 2);
    for pair in candidates.windows(2) {
        assert!(pair[0].calc_score(score_type) >= pair[1].calc_score(score_type));
    }
    for (i, a) in candidates.iter().enumerate() {
        assert!(a.is_complete());
        for b in &candidates[i + 1..] {
            assert!(!a.is_equal(b, true));
        }
    }
}

#[test]
fn test_bin_packing_puts_assignment_in_master() {
    let matrix = bin_packing(3, 2);
    let result = run(&matrix, DetectionConfig::default());

    let best = result.best().unwrap();
    assert_eq!(best.n_blocks(), 3);
    assert_eq!(best.master_conss(), &[3, 4]);
    assert_eq!(best.lineage().detector_chain_string(), "cC");
    assert_eq!(best.lineage().ancestors().first(), Some(&0));
    assert_eq!(best.aggregation_info().map(|info| info.n_reps()), Some(1));
}

#[test]
fn test_empty_matrix_yields_root() {
    let matrix = pattern(0, &[]);
    let result = run(&matrix, DetectionConfig::default());

    assert_eq!(result.candidates().len(), 1);
    assert_eq!(result.stats().rounds, 0);
    assert_eq!(result.best().map(|d| d.n_blocks()), Some(0));
}

// ============================================================================
// Limits
// ============================================================================

#[test]
fn test_zero_rounds_only_finishes_root() {
    let matrix = two_blocks();
    let result = run(&matrix, DetectionConfig::default().with_max_rounds(0));

    assert_eq!(result.stats().rounds, 0);
    assert_eq!(result.stats().propagation_calls, 0);
    assert_eq!(result.candidates().len(), 1);
    let best = result.best().unwrap();
    assert!(best.lineage().is_finished_by_finisher());
    assert_eq!(best.lineage().detector_chain_string(), "C");
}

#[test]
fn test_terminate_early_flag_stops_propagation() {
    let matrix = two_blocks();
    let flag = Arc::new(AtomicBool::new(true));

    let result = DetectionLoop::new(&matrix, DetectionConfig::default())
        .with_terminate_early_flag(flag)
        .run()
        .unwrap();

    assert!(result.terminated_early());
    assert_eq!(result.stats().propagation_calls, 0);
    assert!(result.best().is_some_and(|d| d.is_complete()));
}

#[test]
fn test_candidate_count_termination_cuts_round_short() {
    let matrix = bin_packing(3, 2);

    let result = DetectionLoop::new(&matrix, DetectionConfig::default())
        .with_termination(CandidateCountTermination::new(1))
        .run()
        .unwrap();

    assert!(result.terminated_early());
    assert_eq!(result.stats().propagation_calls, 1);
    assert_eq!(result.stats().rounds, 1);
}

#[test]
fn test_repeated_successor_counts_as_duplicate() {
    let matrix = two_blocks();

    let result = DetectionLoop::new(&matrix, sequential())
        .with_detectors(vec![Box::new(Twice)])
        .run()
        .unwrap();

    let stats = result.stats();
    assert_eq!(stats.candidates_generated, 2);
    assert!(stats.duplicates_dropped >= 1);
    assert_eq!(stats.propagation_calls, 2);
}

#[test]
fn test_pool_capacity_keeps_best() {
    let matrix = bin_packing(3, 2);
    let full = run(&matrix, sequential());
    let capped = run(&matrix, sequential().with_pool_capacity(1));

    assert_eq!(capped.candidates().len(), 1);
    let (best, capped_best) = (full.best().unwrap(), capped.best().unwrap());
    assert!(best.is_equal(capped_best, true));
}

#[test]
fn test_invalid_config_is_rejected() {
    let matrix = two_blocks();
    let mut config = DetectionConfig::default();
    config.detection.pool_capacity = Some(0);

    let result = DetectionLoop::new(&matrix, config).run();

    assert!(matches!(result, Err(DetectError::Config(_))));
}

#[test]
fn test_thread_counts_agree() {
    let matrix = bin_packing(3, 2);
    let mut pooled = DetectionConfig::default();
    pooled.detection.threads = ThreadCount::Count(2);

    let a = run(&matrix, sequential());
    let b = run(&matrix, pooled);

    assert_eq!(a.candidates().len(), b.candidates().len());
    for (x, y) in a.candidates().iter().zip(b.candidates()) {
        assert!(x.is_equal(y, true));
    }
}

// ============================================================================
// Seeds and detectors
// ============================================================================

#[test]
fn test_complete_seed_is_ranked() {
    let matrix = two_blocks();
    let mut seed = PartialDecomposition::new(0, &matrix);
    for index in 0..4 {
        seed.book_as_master_cons(index).unwrap();
        seed.book_as_master_var(index).unwrap();
    }
    seed.flush_booked().unwrap();

    let result = DetectionLoop::new(&matrix, DetectionConfig::default())
        .with_seed(seed)
        .run()
        .unwrap();

    let seeded: Vec<_> = result
        .candidates()
        .iter()
        .filter(|d| d.lineage().user_given() == UserGiven::Complete)
        .collect();
    assert_eq!(seeded.len(), 1);
    assert_eq!(seeded[0].id(), 0);
    assert_eq!(seeded[0].n_master_conss(), 4);
}

#[test]
fn test_partial_seed_is_propagated() {
    let matrix = bin_packing(3, 2);
    let mut seed = PartialDecomposition::new(7, &matrix);
    seed.book_as_master_cons(3).unwrap();
    seed.book_as_master_cons(4).unwrap();
    seed.flush_booked().unwrap();

    let result = DetectionLoop::new(&matrix, DetectionConfig::default())
        .with_detectors(vec![Box::new(crate::detectors::ConnectedDetector)])
        .with_seed(seed)
        .run()
        .unwrap();

    let from_seed = result
        .candidates()
        .iter()
        .find(|d| d.lineage().ancestors().first() == Some(&7))
        .unwrap();
    assert_eq!(from_seed.n_blocks(), 3);
    assert_eq!(from_seed.lineage().user_given(), UserGiven::Partial);
}

#[test]
fn test_seed_completed_to_master_skips_propagation() {
    let matrix = bin_packing(3, 2);
    let mut seed = PartialDecomposition::new(9, &matrix);
    seed.set_n_blocks(3).unwrap();
    for bin in 0..3 {
        seed.book_as_block_cons(bin, bin).unwrap();
    }
    seed.flush_booked().unwrap();

    let result = DetectionLoop::new(&matrix, DetectionConfig::default())
        .with_seed_completed_to_master(seed)
        .run()
        .unwrap();

    let completed = result
        .candidates()
        .iter()
        .find(|d| d.lineage().user_given() == UserGiven::CompletedConssToMaster)
        .unwrap();
    assert_eq!(completed.id(), 9);
    assert!(completed.is_complete());
    assert_eq!(completed.master_conss(), &[3, 4]);
    assert_eq!(completed.n_blocks(), 3);
}

#[test]
fn test_fallback_finisher_completes() {
    let matrix = two_blocks();

    let result = DetectionLoop::new(&matrix, DetectionConfig::default())
        .with_detectors(vec![Box::new(Idle)])
        .run()
        .unwrap();

    let best = result.best().unwrap();
    assert!(best.is_complete());
    assert_eq!(best.lineage().detector_chain_string(), "f");
    assert!(best.lineage().is_finished_by_finisher());
    assert_eq!(result.stats().propagation_calls, 1);
}
