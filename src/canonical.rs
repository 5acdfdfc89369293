//! Canonical ID assignment.
//!
//! Each cluster gets one representative mention ID. The choice is a pure
//! function of cluster membership and input order, so identical input always
//! yields identical canonical IDs. The default rule is first-seen.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::cluster::Clusters;
use crate::config::CanonicalStrategy;
use crate::model::KnowledgeGraph;

/// `mention_id → canonical_id`, total over a batch's mention IDs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalMapping(BTreeMap<String, String>);

impl CanonicalMapping {
    /// The canonical ID for `mention_id`, if it was part of the batch.
    pub fn get(&self, mention_id: &str) -> Option<&str> {
        self.0.get(mention_id).map(String::as_str)
    }

    /// Number of mapped mention IDs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct canonical IDs.
    pub fn distinct_canonical_count(&self) -> usize {
        self.0.values().collect::<BTreeSet<_>>().len()
    }

    /// Iterate `(mention_id, canonical_id)` sorted by mention ID.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Pick the representative of one cluster.
///
/// `cluster` holds input positions into `graph.entities`, ascending.
/// Returns `None` only for an empty cluster.
pub fn assign<'g>(
    cluster: &[usize],
    graph: &'g KnowledgeGraph,
    strategy: CanonicalStrategy,
) -> Option<&'g str> {
    let mention = |pos: usize| &graph.entities[pos].mention;
    let chosen = match strategy {
        CanonicalStrategy::FirstSeen => cluster.iter().copied().min(),
        CanonicalStrategy::LongestMention => cluster
            .iter()
            .copied()
            // max_by_key keeps the last maximum; reversing the key on position keeps the first.
            .max_by_key(|&p| (mention(p).mention.chars().count(), std::cmp::Reverse(p))),
        CanonicalStrategy::LexicographicId => {
            cluster.iter().copied().min_by(|&a, &b| mention(a).id.cmp(&mention(b).id))
        }
    }?;
    Some(graph.entities[chosen].mention.id.as_str())
}

/// Assign every cluster and build the full mapping.
///
/// Returns the mapping plus the canonical IDs in cluster order.
pub fn assign_all(
    clusters: &Clusters,
    graph: &KnowledgeGraph,
    strategy: CanonicalStrategy,
) -> (CanonicalMapping, Vec<String>) {
    let mut mapping = BTreeMap::new();
    let mut order = Vec::with_capacity(clusters.len());
    for cluster in clusters.iter() {
        let Some(canonical) = assign(cluster, graph, strategy) else {
            continue;
        };
        for &pos in cluster {
            mapping.insert(graph.entities[pos].mention.id.clone(), canonical.to_string());
        }
        order.push(canonical.to_string());
    }
    (CanonicalMapping(mapping), order)
}
