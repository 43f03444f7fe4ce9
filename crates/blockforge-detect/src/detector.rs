//! The detector plugin interface.

use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};

use blockforge_decomp::{DetectorRef, PartialDecomposition};

use crate::error::Result;

/// Hands out unique decomposition ids.
///
/// Shared between detectors of one run; ids are unique but not
/// necessarily consecutive per detector.
#[derive(Debug, Default)]
pub struct IdSource {
    next: AtomicUsize,
}

impl IdSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts handing out ids at `first`.
    pub fn starting_at(first: usize) -> Self {
        Self {
            next: AtomicUsize::new(first),
        }
    }

    pub fn next_id(&self) -> usize {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// A structure detector.
///
/// Detectors take a partial decomposition and return refined successors.
/// They never modify their input; every successor is a fresh copy that
/// starts a lineage step naming this detector (see [`successor`]).
pub trait Detector: Send + Sync + Debug {
    /// Unique detector name.
    fn name(&self) -> &str;

    /// Character identifying this detector in detector chains.
    fn chain_char(&self) -> char;

    fn detector_ref(&self) -> DetectorRef {
        DetectorRef::new(self.name(), self.chain_char())
    }

    /// Returns refined successors of `decomp`; possibly none.
    fn propagate<'a>(
        &self,
        decomp: &PartialDecomposition<'a>,
        ids: &IdSource,
    ) -> Result<Vec<PartialDecomposition<'a>>>;

    /// Completes `decomp`, or returns `None` if this detector cannot.
    fn finish<'a>(
        &self,
        _decomp: &PartialDecomposition<'a>,
        _ids: &IdSource,
    ) -> Result<Option<PartialDecomposition<'a>>> {
        Ok(None)
    }
}

/// Copies `parent` under a fresh id and opens a lineage step for `detector`.
pub fn successor<'a, D: Detector + ?Sized>(
    detector: &D,
    parent: &PartialDecomposition<'a>,
    ids: &IdSource,
) -> PartialDecomposition<'a> {
    let mut child = parent.derive(ids.next_id());
    child.lineage_mut().add_detector_chain_info(detector.detector_ref());
    child
}
