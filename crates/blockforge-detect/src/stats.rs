//! Detection statistics.

use std::time::{Duration, Instant};

/// Statistics of one detection run.
///
/// # Example
///
/// ```
/// use blockforge_detect::stats::DetectionStats;
///
/// let mut stats = DetectionStats::default();
/// stats.start();
/// stats.record_propagation();
/// stats.record_candidate(false);
/// stats.record_candidate(true);
/// stats.record_round();
///
/// assert_eq!(stats.rounds, 1);
/// assert_eq!(stats.candidates_generated, 2);
/// assert_eq!(stats.duplicates_dropped, 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct DetectionStats {
    start_time: Option<Instant>,
    /// Completed propagation rounds.
    pub rounds: u64,
    /// Detector calls on a candidate.
    pub propagation_calls: u64,
    /// Candidates returned by detectors, duplicates included.
    pub candidates_generated: u64,
    /// Candidates dropped because an equal one was already known.
    pub duplicates_dropped: u64,
    /// Candidates completed by a finisher.
    pub candidates_finished: u64,
    /// Complete candidates that were scored.
    pub candidates_scored: u64,
}

impl DetectionStats {
    /// Marks the start of detection.
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Whether [`start`](Self::start) was called.
    pub fn is_started(&self) -> bool {
        self.start_time.is_some()
    }

    /// Returns the elapsed time since detection started.
    pub fn elapsed(&self) -> Duration {
        self.start_time.map(|t| t.elapsed()).unwrap_or_default()
    }

    pub fn record_round(&mut self) {
        self.rounds += 1;
    }

    pub fn record_propagation(&mut self) {
        self.propagation_calls += 1;
    }

    /// Records a generated candidate and whether it was a duplicate.
    pub fn record_candidate(&mut self, duplicate: bool) {
        self.candidates_generated += 1;
        if duplicate {
            self.duplicates_dropped += 1;
        }
    }

    /// Records a duplicate found after generation, e.g. among finished
    /// candidates.
    pub fn record_duplicate(&mut self) {
        self.duplicates_dropped += 1;
    }

    pub fn record_finished(&mut self) {
        self.candidates_finished += 1;
    }

    pub fn record_scored(&mut self, count: u64) {
        self.candidates_scored += count;
    }

    /// Returns the candidates generated per second.
    pub fn candidates_per_second(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.candidates_generated as f64 / secs
        } else {
            0.0
        }
    }

    /// Returns the share of generated candidates that were duplicates.
    pub fn duplicate_rate(&self) -> f64 {
        if self.candidates_generated == 0 {
            0.0
        } else {
            self.duplicates_dropped as f64 / self.candidates_generated as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unstarted_stats() {
        let stats = DetectionStats::default();
        assert!(!stats.is_started());
        assert_eq!(stats.elapsed(), Duration::ZERO);
        assert_eq!(stats.candidates_per_second(), 0.0);
        assert_eq!(stats.duplicate_rate(), 0.0);
    }

    #[test]
    fn test_duplicate_rate() {
        let mut stats = DetectionStats::default();
        stats.record_candidate(false);
        stats.record_candidate(true);
        stats.record_candidate(false);
        stats.record_candidate(true);

        assert_eq!(stats.duplicates_dropped, 2);
        assert!((stats.duplicate_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_scored_accumulates() {
        let mut stats = DetectionStats::default();
        stats.record_scored(3);
        stats.record_scored(2);
        stats.record_finished();

        assert_eq!(stats.candidates_scored, 5);
        assert_eq!(stats.candidates_finished, 1);
    }
}
