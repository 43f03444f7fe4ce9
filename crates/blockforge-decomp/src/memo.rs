//! Generation-keyed memoization for derived values.

/// A cached value tagged with the generation it was computed for.
///
/// The owning decomposition bumps its generation on every structural
/// mutation, so a stale entry is simply one with an older tag.
#[derive(Debug, Clone)]
pub(crate) struct Memo<T> {
    entry: Option<(u64, T)>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self { entry: None }
    }
}

impl<T> Memo<T> {
    pub(crate) fn get(&self, generation: u64) -> Option<&T> {
        match &self.entry {
            Some((tag, value)) if *tag == generation => Some(value),
            _ => None,
        }
    }

    pub(crate) fn set(&mut self, generation: u64, value: T) -> &T {
        let (_, value) = self.entry.insert((generation, value));
        value
    }

    pub(crate) fn is_fresh(&self, generation: u64) -> bool {
        self.get(generation).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memo_generations() {
        let mut memo: Memo<f64> = Memo::default();
        assert!(memo.get(0).is_none());
        memo.set(3, 0.5);
        assert_eq!(memo.get(3), Some(&0.5));
        assert!(memo.get(4).is_none());
        assert!(!memo.is_fresh(2));
    }
}
