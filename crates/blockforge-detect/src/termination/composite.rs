//! Composite termination conditions (AND/OR).

use super::Termination;
use crate::scope::DetectionScope;

/// Combines terminations with OR logic (any must terminate).
///
/// Wraps a tuple of terminations, or a `Vec` of boxed ones when the set is
/// only known at runtime.
///
/// # Examples
///
/// ```
/// use blockforge_detect::termination::{OrTermination, RoundCountTermination, TimeTermination};
///
/// // Terminate after 30 seconds OR 3 rounds
/// let termination = OrTermination::new((
///     TimeTermination::seconds(30),
///     RoundCountTermination::new(3),
/// ));
/// ```
#[derive(Debug)]
pub struct OrTermination<T>(pub T);

impl<T> OrTermination<T> {
    /// Creates a new OR termination from a tuple of terminations.
    pub fn new(terminations: T) -> Self {
        Self(terminations)
    }
}

impl Termination for OrTermination<Vec<Box<dyn Termination>>> {
    fn is_terminated(&self, scope: &DetectionScope) -> bool {
        self.0.iter().any(|t| t.is_terminated(scope))
    }
}

/// Combines terminations with AND logic (all must terminate).
///
/// An empty `Vec` never terminates.
#[derive(Debug)]
pub struct AndTermination<T>(pub T);

impl<T> AndTermination<T> {
    /// Creates a new AND termination from a tuple of terminations.
    pub fn new(terminations: T) -> Self {
        Self(terminations)
    }
}

impl Termination for AndTermination<Vec<Box<dyn Termination>>> {
    fn is_terminated(&self, scope: &DetectionScope) -> bool {
        !self.0.is_empty() && self.0.iter().all(|t| t.is_terminated(scope))
    }
}

/// Generates `Termination` implementations for OR and AND tuples.
macro_rules! impl_tuple_termination {
    ($($idx:tt: $T:ident),+) => {
        impl<$($T),+> Termination for OrTermination<($($T,)+)>
        where
            $($T: Termination,)+
        {
            fn is_terminated(&self, scope: &DetectionScope) -> bool {
                $((self.0).$idx.is_terminated(scope))||+
            }
        }

        impl<$($T),+> Termination for AndTermination<($($T,)+)>
        where
            $($T: Termination,)+
        {
            fn is_terminated(&self, scope: &DetectionScope) -> bool {
                $((self.0).$idx.is_terminated(scope))&&+
            }
        }
    };
}

impl_tuple_termination!(0: T0);
impl_tuple_termination!(0: T0, 1: T1);
impl_tuple_termination!(0: T0, 1: T1, 2: T2);
impl_tuple_termination!(0: T0, 1: T1, 2: T2, 3: T3);
impl_tuple_termination!(0: T0, 1: T1, 2: T2, 3: T3, 4: T4);
