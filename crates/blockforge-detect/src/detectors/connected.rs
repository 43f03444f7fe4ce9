//! Connected-components detector.

use blockforge_decomp::PartialDecomposition;
use tracing::trace;

use crate::detector::{successor, Detector, IdSource};
use crate::error::Result;

/// Completes a decomposition by the connected components of its open part.
///
/// Yields nothing for a decomposition that is already complete.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectedDetector;

impl ConnectedDetector {
    fn completed<'a>(
        &self,
        decomp: &PartialDecomposition<'a>,
        ids: &IdSource,
    ) -> Result<Option<PartialDecomposition<'a>>> {
        if decomp.is_complete() {
            return Ok(None);
        }
        let mut child = successor(self, decomp, ids);
        child.complete_by_connected()?;
        trace!(
            parent = decomp.id(),
            child = child.id(),
            blocks = child.n_blocks(),
            "completed by connected components"
        );
        Ok(Some(child))
    }
}

impl Detector for ConnectedDetector {
    fn name(&self) -> &str {
        "connected"
    }

    fn chain_char(&self) -> char {
        'C'
    }

    fn propagate<'a>(
        &self,
        decomp: &PartialDecomposition<'a>,
        ids: &IdSource,
    ) -> Result<Vec<PartialDecomposition<'a>>> {
        Ok(self.completed(decomp, ids)?.into_iter().collect())
    }

    fn finish<'a>(
        &self,
        decomp: &PartialDecomposition<'a>,
        ids: &IdSource,
    ) -> Result<Option<PartialDecomposition<'a>>> {
        self.completed(decomp, ids)
    }
}
