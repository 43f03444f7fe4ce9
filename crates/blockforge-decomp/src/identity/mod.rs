//! Hashing, equality and identical-block detection.
//!
//! Two decompositions are equal if they put the same constraints and
//! variables in the master, the linking set and the blocks, regardless of
//! how the blocks are numbered. Hash values respect that: equal
//! decompositions always hash alike, so a pool can filter by hash before
//! running the full comparison.

mod aggregation;
mod blocks;


use std::borrow::Cow;

pub use aggregation::AggregationInfo;
pub use blocks::{Identity, IsomorphismOracle};

use crate::partial::PartialDecomposition;

const PRIMES: [u64; 32] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89,
    97, 101, 103, 107, 109, 113, 127, 131,
];

const MIX: u64 = 1_000_003;

/// Order-independent hash of an index set.
fn index_set_hash(indices: &[usize], salt: usize) -> u64 {
    indices.iter().fold(0u64, |acc, &index| {
        let prime = PRIMES[(index + salt) % PRIMES.len()];
        acc.wrapping_add((index as u64 + 1).wrapping_mul(prime))
    })
}

fn mix(hash: u64, value: u64) -> u64 {
    hash.wrapping_mul(MIX).wrapping_add(value)
}

fn sorted_view(values: &[usize], sort: bool) -> Cow<'_, [usize]> {
    if sort {
        let mut owned = values.to_vec();
        owned.sort_unstable();
        Cow::Owned(owned)
    } else {
        Cow::Borrowed(values)
    }
}

impl PartialDecomposition<'_> {
    /// Blocks ordered by their smallest constraint, or by `n_conss` plus
    /// their smallest variable if they have no constraint.
    pub(crate) fn canonical_block_order(&self) -> Vec<usize> {
        let n_conss = self.n_conss();
        let key = |block: usize| {
            let conss = &self.conss_for_blocks[block];
            let vars = &self.vars_for_blocks[block];
            conss
                .iter()
                .min()
                .copied()
                .or_else(|| vars.iter().min().map(|&v| n_conss + v))
                .unwrap_or(usize::MAX)
        };
        let mut order: Vec<usize> = (0..self.n_blocks).collect();
        order.sort_by_key(|&b| (key(b), b));
        order
    }

    /// Computes the block-order invariant hash value.
    pub fn calc_hash_value(&self) -> u64 {
        let mut hash = mix(self.n_blocks as u64, PRIMES[0]);
        hash = mix(hash, self.n_open_vars() as u64);
        hash = mix(hash, index_set_hash(&self.master_conss, 1));
        hash = mix(hash, index_set_hash(&self.master_vars, 2));
        hash = mix(hash, index_set_hash(&self.linking_vars, 3));
        for block in self.canonical_block_order() {
            hash = mix(hash, index_set_hash(&self.conss_for_blocks[block], 5));
            hash = mix(hash, index_set_hash(&self.vars_for_blocks[block], 7));
        }
        let stairlinking: Vec<usize> = self.stairlinking_vars.iter().flatten().copied().collect();
        mix(hash, index_set_hash(&stairlinking, 11))
    }

    /// Hash value, recomputed only after a mutation.
    pub fn hash_value(&mut self) -> u64 {
        let generation = self.generation;
        if let Some(&hash) = self.caches.hash.get(generation) {
            return hash;
        }
        let hash = self.calc_hash_value();
        *self.caches.hash.set(generation, hash)
    }

    /// Stairlinking variables keyed by the canonical positions of their two
    /// blocks.
    fn canonical_stairlinking(&self, position: &[usize]) -> Vec<(usize, usize, usize)> {
        let mut entries: Vec<(usize, usize, usize)> = self
            .stairlinking_vars
            .iter()
            .enumerate()
            .filter(|(_, vars)| !vars.is_empty())
            .flat_map(|(first, vars)| {
                let a = position[first];
                let b = position.get(first + 1).copied().unwrap_or(usize::MAX);
                let pair = (a.min(b), a.max(b));
                vars.iter().map(move |&var| (var, pair.0, pair.1))
            })
            .collect();
        entries.sort_unstable();
        entries
    }

    /// True if both decompositions assign every index alike, up to block
    /// numbering.
    ///
    /// With `sort_first` unsorted vectors are compared as sets; without it
    /// they are compared as stored, which is only meaningful if both sides
    /// are sorted.
    pub fn is_equal(&self, other: &PartialDecomposition<'_>, sort_first: bool) -> bool {
        if self.n_blocks != other.n_blocks
            || self.n_conss() != other.n_conss()
            || self.n_vars() != other.n_vars()
            || self.space_kind() != other.space_kind()
        {
            return false;
        }
        let sort_self = sort_first && !self.sorted;
        let sort_other = sort_first && !other.sorted;
        let same = |a: &[usize], b: &[usize]| {
            a.len() == b.len() && sorted_view(a, sort_self) == sorted_view(b, sort_other)
        };

        if !same(&self.master_conss, &other.master_conss)
            || !same(&self.master_vars, &other.master_vars)
            || !same(&self.linking_vars, &other.linking_vars)
        {
            return false;
        }

        let order = self.canonical_block_order();
        let other_order = other.canonical_block_order();
        for (&mine, &theirs) in order.iter().zip(&other_order) {
            if !same(&self.conss_for_blocks[mine], &other.conss_for_blocks[theirs])
                || !same(&self.vars_for_blocks[mine], &other.vars_for_blocks[theirs])
            {
                return false;
            }
        }

        let positions = |order: &[usize]| {
            let mut position = vec![0; order.len()];
            for (pos, &block) in order.iter().enumerate() {
                position[block] = pos;
            }
            position
        };
        self.canonical_stairlinking(&positions(&order))
            == other.canonical_stairlinking(&positions(&other_order))
    }
}
