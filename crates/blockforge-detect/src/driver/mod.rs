//! The detection loop.
//!
//! Detection runs in four phases:
//!
//! 1. Propagation rounds: every detector refines every open candidate of the
//!    current frontier. Complete successors are set aside, incomplete ones
//!    that were not seen before form the next frontier.
//! 2. Finishing: every incomplete candidate ever seen is completed, by the
//!    first detector whose `finish` applies or by
//!    [`PartialDecomposition::complete`] otherwise.
//! 3. Postprocessing: master constraints that fit into one block are moved
//!    there, yielding additional candidates.
//! 4. Scoring: aggregation information and scores are computed in parallel,
//!    then candidates are deduplicated and ranked.
//!
//! Termination only cuts phase 1 short.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use blockforge_config::{DetectionConfig, ScoreType, ThreadCount};
use blockforge_core::IndexSpace;
use blockforge_decomp::{DetectorRef, IsomorphismOracle, PartialDecomposition, UserGiven};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::detector::{Detector, IdSource};
use crate::detectors::build_detectors;
use crate::error::Result;
use crate::pool::CandidatePool;
use crate::scope::DetectionScope;
use crate::stats::DetectionStats;
use crate::termination::{OrTermination, Termination, TimeTermination};

#[cfg(test)]
mod tests;

/// Finisher used when no detector can complete a candidate.
fn fallback_finisher() -> DetectorRef {
    DetectorRef::new("complete", 'f')
}

fn postprocessor() -> DetectorRef {
    DetectorRef::new("postprocess", 'p')
}

/// Explores decompositions of one index space.
///
/// # Example
///
/// ```
/// use blockforge_config::DetectionConfig;
/// use blockforge_core::ConstraintMatrix;
/// use blockforge_detect::DetectionLoop;
///
/// let matrix = ConstraintMatrix::from_pattern(4, &[&[0, 1], &[1], &[2, 3], &[3]]).unwrap();
/// let result = DetectionLoop::new(&matrix, DetectionConfig::default())
///     .run()
///     .unwrap();
///
/// let best = result.best().unwrap();
/// assert!(best.is_complete());
/// assert_eq!(best.n_blocks(), 2);
/// ```
pub struct DetectionLoop<'s> {
    space: &'s dyn IndexSpace,
    config: DetectionConfig,
    detectors: Vec<Box<dyn Detector>>,
    seeds: Vec<PartialDecomposition<'s>>,
    terminations: Vec<Box<dyn Termination>>,
    oracle: Option<&'s dyn IsomorphismOracle>,
    terminate_early_flag: Option<Arc<AtomicBool>>,
}

impl<'s> DetectionLoop<'s> {
    /// Creates a loop running the detectors named in `config`.
    pub fn new(space: &'s dyn IndexSpace, config: DetectionConfig) -> Self {
        let detectors = build_detectors(&config.detectors);
        Self {
            space,
            config,
            detectors,
            seeds: Vec::new(),
            terminations: Vec::new(),
            oracle: None,
            terminate_early_flag: None,
        }
    }

    /// Replaces the configured detectors.
    pub fn with_detectors(mut self, detectors: Vec<Box<dyn Detector>>) -> Self {
        self.detectors = detectors;
        self
    }

    pub fn with_detector(mut self, detector: impl Detector + 'static) -> Self {
        self.detectors.push(Box::new(detector));
        self
    }

    /// Adds a user-given decomposition of the same index space.
    ///
    /// Complete seeds go straight to scoring; partial ones are propagated
    /// like the empty root.
    pub fn with_seed(mut self, mut seed: PartialDecomposition<'s>) -> Self {
        if seed.lineage().user_given() == UserGiven::Not {
            let given = if seed.is_complete() {
                UserGiven::Complete
            } else {
                UserGiven::Partial
            };
            seed.lineage_mut().set_user_given(given);
        }
        self.seeds.push(seed);
        self
    }

    /// Adds a user-given partial decomposition that is completed by moving
    /// its open constraints to the master instead of being propagated.
    pub fn with_seed_completed_to_master(mut self, mut seed: PartialDecomposition<'s>) -> Self {
        seed.lineage_mut().set_user_given(UserGiven::CompletedConssToMaster);
        self.seeds.push(seed);
        self
    }

    /// Adds a termination checked alongside the configured time limit.
    pub fn with_termination(mut self, termination: impl Termination + 'static) -> Self {
        self.terminations.push(Box::new(termination));
        self
    }

    /// Decides block identity where the trivial check cannot.
    pub fn with_oracle(mut self, oracle: &'s dyn IsomorphismOracle) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Shares a flag that stops propagation once set.
    pub fn with_terminate_early_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.terminate_early_flag = Some(flag);
        self
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn detectors(&self) -> &[Box<dyn Detector>] {
        &self.detectors
    }

    /// Runs detection and returns the distinct complete candidates, best
    /// first by the configured score.
    pub fn run(self) -> Result<DetectionResult<'s>> {
        let DetectionLoop {
            space,
            config,
            detectors,
            seeds,
            mut terminations,
            oracle,
            terminate_early_flag,
        } = self;
        config.validate()?;

        if let Some(limit) = config.time_limit() {
            terminations.push(Box::new(TimeTermination::new(limit)));
        }
        let termination = OrTermination::new(terminations);
        let mut scope = DetectionScope::new();
        if let Some(flag) = terminate_early_flag {
            scope = scope.with_terminate_early_flag(flag);
        }
        let should_stop =
            |scope: &DetectionScope| scope.is_terminate_early() || termination.is_terminated(scope);

        scope.start_detecting();
        info!(
            event = "detection_start",
            conss = space.n_conss(),
            vars = space.n_vars(),
            nonzeros = space.n_nonzeros(),
            detectors = detectors.len(),
            max_rounds = config.detection.max_rounds,
        );

        let first_id = seeds.iter().map(|s| s.id() + 1).max().unwrap_or(0);
        let ids = IdSource::starting_at(first_id);
        let score_type = config.scoring.score_type;

        let mut explored = CandidatePool::new(score_type);
        let mut complete: Vec<PartialDecomposition<'s>> = Vec::new();
        let mut frontier: Vec<PartialDecomposition<'s>> = Vec::new();

        let root = PartialDecomposition::new(ids.next_id(), space);
        for candidate in std::iter::once(root).chain(seeds) {
            let mut candidate = candidate.with_scoring(config.scoring);
            if candidate.lineage().user_given() == UserGiven::CompletedConssToMaster {
                candidate.complete_conss_to_master()?;
            }
            if candidate.is_complete() {
                complete.push(candidate);
            } else if explored.insert(candidate.clone()) {
                frontier.push(candidate);
            }
        }

        // Phase 1: propagation
        let mut terminated = false;
        for round in 0..config.detection.max_rounds {
            if frontier.is_empty() {
                break;
            }
            if should_stop(&scope) {
                terminated = true;
                break;
            }
            let mut next = Vec::new();
            'parents: for parent in &frontier {
                for detector in &detectors {
                    if should_stop(&scope) {
                        terminated = true;
                        break 'parents;
                    }
                    let started = Instant::now();
                    let successors = detector.propagate(parent, &ids)?;
                    let seconds = started.elapsed().as_secs_f64();
                    scope.stats_mut().record_propagation();

                    for mut child in successors {
                        child.lineage_mut().add_clock_time(seconds);
                        child.record_transition_from(parent);
                        debug!(
                            detector = detector.name(),
                            parent = parent.id(),
                            candidate = child.id(),
                            blocks = child.n_blocks(),
                            open_conss = child.n_open_conss(),
                            open_vars = child.n_open_vars(),
                            "candidate propagated"
                        );
                        if child.is_complete() {
                            scope.stats_mut().record_candidate(false);
                            complete.push(child);
                        } else {
                            let is_new = explored.insert(child.clone());
                            scope.stats_mut().record_candidate(!is_new);
                            if is_new {
                                next.push(child);
                            }
                        }
                    }
                }
            }
            scope.stats_mut().record_round();
            info!(
                event = "round_end",
                round,
                frontier = next.len(),
                complete = complete.len(),
                elapsed_ms = scope.stats().elapsed().as_millis() as u64,
            );
            frontier = next;
            if terminated {
                break;
            }
        }

        // Phase 2: finishing
        for candidate in explored.iter() {
            let mut finished = None;
            for detector in &detectors {
                if let Some(done) = detector.finish(candidate, &ids)? {
                    finished = Some(done);
                    break;
                }
            }
            let mut finished = match finished {
                Some(done) => done,
                None => {
                    let mut done = candidate.derive(ids.next_id());
                    done.lineage_mut().add_detector_chain_info(fallback_finisher());
                    done.complete()?;
                    done
                }
            };
            finished.lineage_mut().set_finished_by_finisher(true);
            finished.record_transition_from(candidate);
            scope.stats_mut().record_finished();
            complete.push(finished);
        }

        // Phase 3: postprocessing
        if config.detection.postprocess {
            let mut extra = Vec::new();
            for candidate in &complete {
                let mut post = candidate.derive(ids.next_id());
                post.lineage_mut().add_detector_chain_info(postprocessor());
                if post.postprocess_master_to_blocks()? {
                    post.record_transition_from(candidate);
                    extra.push(post);
                }
            }
            debug!(postprocessed = extra.len(), "postprocessing done");
            complete.extend(extra);
        }

        // Phase 4: scoring
        let aggregation = &config.aggregation;
        let prepare = |decomp: &mut PartialDecomposition<'s>| {
            if aggregation.enabled {
                decomp.calc_aggregation_information(aggregation, oracle);
            }
            decomp.score(score_type);
        };
        match config.detection.threads {
            ThreadCount::None => complete.iter_mut().for_each(&prepare),
            ThreadCount::Auto => complete.par_iter_mut().for_each(&prepare),
            ThreadCount::Count(n) => {
                let pool = rayon::ThreadPoolBuilder::new().num_threads(n).build()?;
                pool.install(|| complete.par_iter_mut().for_each(&prepare));
            }
        }
        scope.stats_mut().record_scored(complete.len() as u64);

        let mut ranked = CandidatePool::new(score_type).with_capacity(config.detection.pool_capacity);
        for candidate in complete {
            if !ranked.insert(candidate) {
                scope.stats_mut().record_duplicate();
            }
        }
        let mut candidates = ranked.into_ranked();

        let best_score = candidates.first_mut().map(|best| best.score(score_type));
        let stats = scope.into_stats();
        info!(
            event = "detection_end",
            rounds = stats.rounds,
            candidates = candidates.len(),
            duplicates = stats.duplicates_dropped,
            best_score = best_score.unwrap_or(0.0),
            terminated_early = terminated,
            duration_ms = stats.elapsed().as_millis() as u64,
        );

        Ok(DetectionResult {
            candidates,
            score_type,
            stats,
            terminated_early: terminated,
        })
    }
}

/// Outcome of a detection run.
#[derive(Debug)]
pub struct DetectionResult<'s> {
    candidates: Vec<PartialDecomposition<'s>>,
    score_type: ScoreType,
    stats: DetectionStats,
    terminated_early: bool,
}

impl<'s> DetectionResult<'s> {
    /// Distinct complete candidates, best first.
    pub fn candidates(&self) -> &[PartialDecomposition<'s>] {
        &self.candidates
    }

    pub fn best(&self) -> Option<&PartialDecomposition<'s>> {
        self.candidates.first()
    }

    /// Score type the candidates are ranked by.
    pub fn score_type(&self) -> ScoreType {
        self.score_type
    }

    pub fn stats(&self) -> &DetectionStats {
        &self.stats
    }

    /// True if a termination cut propagation short.
    pub fn terminated_early(&self) -> bool {
        self.terminated_early
    }

    pub fn into_candidates(self) -> Vec<PartialDecomposition<'s>> {
        self.candidates
    }
}
