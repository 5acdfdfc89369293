//! Candidate-pair generation for the cluster builder.
//!
//! The builder only scores the pairs a generator hands it. [`AllPairs`] is the
//! exhaustive O(n²) baseline; [`TypeBlocking`] buckets mentions by declared
//! type and never produces a pair that the type gate would reject anyway.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::CandidateStrategy;
use crate::model::EntityMention;

/// Produces the unordered index pairs `(i, j)` with `i < j` to be scored.
pub trait CandidateGenerator: Send + Sync {
    fn candidate_pairs(&self, mentions: &[&EntityMention]) -> Vec<(usize, usize)>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Every unordered pair, in row-major order.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllPairs;

impl CandidateGenerator for AllPairs {
    fn candidate_pairs(&self, mentions: &[&EntityMention]) -> Vec<(usize, usize)> {
        let n = mentions.len();
        let mut pairs = Vec::with_capacity(n.saturating_mul(n.saturating_sub(1)) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                pairs.push((i, j));
            }
        }
        pairs
    }

    fn name(&self) -> &'static str {
        "all-pairs"
    }
}

/// Pairs of mentions that share at least one declared type.
///
/// Untyped mentions are never paired. With `require_type_overlap` set this
/// yields exactly the pairs that can match; without it, it is a lossy filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeBlocking;

impl CandidateGenerator for TypeBlocking {
    fn candidate_pairs(&self, mentions: &[&EntityMention]) -> Vec<(usize, usize)> {
        let mut buckets: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (idx, mention) in mentions.iter().enumerate() {
            for t in &mention.types {
                buckets.entry(t.as_str()).or_default().push(idx);
            }
        }

        let mut pairs = BTreeSet::new();
        for members in buckets.values() {
            for (k, &i) in members.iter().enumerate() {
                for &j in &members[k + 1..] {
                    pairs.insert((i, j));
                }
            }
        }
        pairs.into_iter().collect()
    }

    fn name(&self) -> &'static str {
        "type-blocking"
    }
}

/// The generator selected by a config value.
pub fn for_strategy(strategy: CandidateStrategy) -> &'static dyn CandidateGenerator {
    match strategy {
        CandidateStrategy::AllPairs => &AllPairs,
        CandidateStrategy::TypeBlocking => &TypeBlocking,
    }
}
