//! Provenance index: which mentions, from which chunks, collapsed into each
//! canonical entity.
//!
//! Every input occurrence yields one [`MentionRecord`], including repeated
//! occurrences of the same mention ID, so an auditor can trace a canonical
//! entity back to every chunk that produced it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::canonical::CanonicalMapping;
use crate::model::KnowledgeGraph;

/// One original mention grouped under its canonical ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionRecord {
    pub mention_id: String,
    /// Surface text as extracted.
    pub text: String,
    /// Source chunk, carried through unchanged.
    pub chunk_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// `canonical_id → mention records` in input order.
pub type ProvenanceIndex = BTreeMap<String, Vec<MentionRecord>>;

/// Group every input mention under its canonical ID.
///
/// Mentions missing from `mapping` are indexed under their own ID; a mapping
/// produced by [`crate::canonical::assign_all`] over the same batch is total,
/// so that only happens with a hand-built mapping.
pub fn index(graph: &KnowledgeGraph, mapping: &CanonicalMapping) -> ProvenanceIndex {
    let mut out = ProvenanceIndex::new();
    for entry in &graph.entities {
        let id = entry.mention.id.as_str();
        let canonical = mapping.get(id).unwrap_or(id);
        out.entry(canonical.to_string())
            .or_default()
            .push(MentionRecord {
                mention_id: id.to_string(),
                text: entry.mention.mention.clone(),
                chunk_index: entry.chunk_index,
                confidence: entry.confidence,
            });
    }
    out
}
