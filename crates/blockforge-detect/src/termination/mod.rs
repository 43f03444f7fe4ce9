//! Termination conditions for the detection loop.

mod composite;
mod count;
mod external;
mod time;

use std::fmt::Debug;

use crate::scope::DetectionScope;

pub use composite::{AndTermination, OrTermination};
pub use count::{CandidateCountTermination, RoundCountTermination};
pub use external::ExternalTermination;
pub use time::TimeTermination;

/// Trait for determining when to stop detecting.
///
/// Checked before every detector call and between rounds. Candidates found
/// so far are still finished and scored after termination.
pub trait Termination: Send + Debug {
    /// Returns true if detection should stop.
    fn is_terminated(&self, scope: &DetectionScope) -> bool;
}

impl<T: Termination + ?Sized> Termination for Box<T> {
    fn is_terminated(&self, scope: &DetectionScope) -> bool {
        (**self).is_terminated(scope)
    }
}
