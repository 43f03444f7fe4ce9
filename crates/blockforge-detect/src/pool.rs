//! Deduplicating pool of candidate decompositions.

use std::cmp::Ordering;

use blockforge_config::ScoreType;
use blockforge_decomp::PartialDecomposition;
use tracing::trace;

#[derive(Debug)]
struct Entry<'a> {
    hash: u64,
    decomp: PartialDecomposition<'a>,
}

/// Candidates of one detection run, free of duplicates.
///
/// Two candidates are duplicates if their hashes match and they are equal
/// up to sorting (see [`PartialDecomposition::is_equal`]). With a capacity,
/// inserting past it evicts the worst candidate by `score_type`; among
/// equally scored candidates the newest goes first.
///
/// # Example
///
/// ```
/// use blockforge_config::ScoreType;
/// use blockforge_core::ConstraintMatrix;
/// use blockforge_decomp::PartialDecomposition;
/// use blockforge_detect::CandidatePool;
///
/// let matrix = ConstraintMatrix::from_pattern(2, &[&[0], &[1]]).unwrap();
/// let mut pool = CandidatePool::new(ScoreType::MaxWhite);
///
/// assert!(pool.insert(PartialDecomposition::new(0, &matrix)));
/// assert!(!pool.insert(PartialDecomposition::new(1, &matrix)));
/// assert_eq!(pool.len(), 1);
/// ```
#[derive(Debug)]
pub struct CandidatePool<'a> {
    entries: Vec<Entry<'a>>,
    score_type: ScoreType,
    capacity: Option<usize>,
}

impl<'a> CandidatePool<'a> {
    pub fn new(score_type: ScoreType) -> Self {
        Self {
            entries: Vec::new(),
            score_type,
            capacity: None,
        }
    }

    /// Keeps at most `capacity` candidates; `None` keeps all.
    pub fn with_capacity(mut self, capacity: Option<usize>) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn score_type(&self) -> ScoreType {
        self.score_type
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if an equal candidate is already pooled. Caches the hash of
    /// `decomp`.
    pub fn contains(&self, decomp: &mut PartialDecomposition<'_>) -> bool {
        let hash = decomp.hash_value();
        self.position_of(hash, decomp).is_some()
    }

    fn position_of(&self, hash: u64, decomp: &PartialDecomposition<'_>) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.hash == hash && entry.decomp.is_equal(decomp, true))
    }

    /// Adds `decomp` unless an equal candidate is pooled.
    ///
    /// Returns `false` for a duplicate. A candidate that is accepted and
    /// then immediately evicted by the capacity still counts as new.
    pub fn insert(&mut self, mut decomp: PartialDecomposition<'a>) -> bool {
        let hash = decomp.hash_value();
        if let Some(pos) = self.position_of(hash, &decomp) {
            trace!(
                candidate = decomp.id(),
                duplicate_of = self.entries[pos].decomp.id(),
                "duplicate candidate dropped"
            );
            return false;
        }
        self.entries.push(Entry { hash, decomp });
        if self.capacity.is_some_and(|cap| self.entries.len() > cap) {
            self.evict_worst();
        }
        true
    }

    fn evict_worst(&mut self) {
        let score_type = self.score_type;
        let mut worst: Option<(usize, f64)> = None;
        for (pos, entry) in self.entries.iter_mut().enumerate() {
            let score = entry.decomp.score(score_type);
            if worst.map_or(true, |(_, w)| score <= w) {
                worst = Some((pos, score));
            }
        }
        if let Some((pos, score)) = worst {
            let evicted = self.entries.remove(pos);
            trace!(candidate = evicted.decomp.id(), score, "candidate evicted");
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PartialDecomposition<'a>> {
        self.entries.iter().map(|entry| &entry.decomp)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PartialDecomposition<'a>> {
        self.entries.iter_mut().map(|entry| &mut entry.decomp)
    }

    /// The best candidate by the pool's score type, earliest first on ties.
    pub fn best(&mut self) -> Option<&PartialDecomposition<'a>> {
        let score_type = self.score_type;
        let mut best: Option<(usize, f64)> = None;
        for (pos, entry) in self.entries.iter_mut().enumerate() {
            let score = entry.decomp.score(score_type);
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((pos, score));
            }
        }
        best.map(|(pos, _)| &self.entries[pos].decomp)
    }

    /// Consumes the pool, returning candidates best first.
    ///
    /// Ties keep insertion order.
    pub fn into_ranked(self) -> Vec<PartialDecomposition<'a>> {
        let score_type = self.score_type;
        let mut scored: Vec<(f64, PartialDecomposition<'a>)> = self
            .entries
            .into_iter()
            .map(|mut entry| (entry.decomp.score(score_type), entry.decomp))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        scored.into_iter().map(|(_, decomp)| decomp).collect()
    }
}
