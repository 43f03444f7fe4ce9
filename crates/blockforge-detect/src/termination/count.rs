//! Count-based terminations.

use super::Termination;
use crate::scope::DetectionScope;

/// Terminates after a number of completed rounds.
#[derive(Debug, Clone, Copy)]
pub struct RoundCountTermination {
    limit: u64,
}

impl RoundCountTermination {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl Termination for RoundCountTermination {
    fn is_terminated(&self, scope: &DetectionScope) -> bool {
        scope.round_count() >= self.limit
    }
}

/// Terminates once detectors generated a number of candidates.
///
/// Duplicates count as generated.
#[derive(Debug, Clone, Copy)]
pub struct CandidateCountTermination {
    limit: u64,
}

impl CandidateCountTermination {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl Termination for CandidateCountTermination {
    fn is_terminated(&self, scope: &DetectionScope) -> bool {
        scope.candidate_count() >= self.limit
    }
}
