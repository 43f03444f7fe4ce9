//! Detection-level scope.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::stats::DetectionStats;

/// Progress of one detection run, read by terminations.
#[derive(Debug, Default)]
pub struct DetectionScope {
    stats: DetectionStats,
    terminate_early_flag: Option<Arc<AtomicBool>>,
}

impl DetectionScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares a flag that stops detection at the next check once set.
    pub fn with_terminate_early_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.terminate_early_flag = Some(flag);
        self
    }

    pub fn start_detecting(&mut self) {
        self.stats = DetectionStats::default();
        self.stats.start();
    }

    /// Time since [`start_detecting`](Self::start_detecting), if started.
    pub fn elapsed(&self) -> Option<Duration> {
        self.stats.is_started().then(|| self.stats.elapsed())
    }

    pub fn round_count(&self) -> u64 {
        self.stats.rounds
    }

    pub fn candidate_count(&self) -> u64 {
        self.stats.candidates_generated
    }

    pub fn is_terminate_early(&self) -> bool {
        self.terminate_early_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    pub fn stats(&self) -> &DetectionStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut DetectionStats {
        &mut self.stats
    }

    pub fn into_stats(self) -> DetectionStats {
        self.stats
    }
}
