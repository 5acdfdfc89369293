//! Relation linker: rewrites relation endpoints to canonical IDs and removes
//! the duplicates that canonicalization exposes.
//!
//! Endpoints that never made it into the batch keep their original ID, and
//! literal objects pass through untouched. Nothing here can fail.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::erg::EntityResolutionGraph;
use crate::model::{Relation, RelationObject};

/// A relation with its endpoints rewritten to canonical IDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedRelation {
    pub original: Relation,
    pub canonical_subject_id: String,
    /// Always the input predicate; predicates are not canonicalized.
    pub canonical_predicate: String,
    pub canonical_object: RelationObject,
    pub subject_remapped: bool,
    pub object_remapped: bool,
}

impl LinkedRelation {
    /// `subject | predicate | object` key used for deduplication.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.canonical_subject_id, self.canonical_predicate, self.canonical_object
        )
    }

    /// A fresh relation carrying only the canonical endpoints.
    pub fn to_relation(&self) -> Relation {
        Relation {
            subject_id: self.canonical_subject_id.clone(),
            predicate: self.canonical_predicate.clone(),
            object: self.canonical_object.clone(),
        }
    }
}

/// Outcome of linking a relation list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkingResult {
    pub linked_relations: Vec<LinkedRelation>,
    /// Remapped endpoints across all relations (0, 1 or 2 per relation).
    pub remapped_count: usize,
    pub literal_object_count: usize,
}

/// Canonical ID for `id`, falling back to `id` itself.
fn canonicalize(erg: &EntityResolutionGraph, id: &str) -> String {
    erg.canonical_id(id).unwrap_or(id).to_string()
}

/// Rewrite every relation's endpoints through `erg`.
pub fn link_relations(relations: &[Relation], erg: &EntityResolutionGraph) -> LinkingResult {
    let mut result = LinkingResult {
        linked_relations: Vec::with_capacity(relations.len()),
        ..Default::default()
    };

    for relation in relations {
        let canonical_subject_id = canonicalize(erg, &relation.subject_id);
        let subject_remapped = canonical_subject_id != relation.subject_id;

        let (canonical_object, object_remapped) = match &relation.object {
            RelationObject::Entity(id) => {
                let canonical = canonicalize(erg, id);
                let remapped = canonical != *id;
                (RelationObject::Entity(canonical), remapped)
            }
            RelationObject::Literal(lit) => {
                result.literal_object_count += 1;
                (RelationObject::Literal(*lit), false)
            }
        };

        result.remapped_count += usize::from(subject_remapped) + usize::from(object_remapped);
        result.linked_relations.push(LinkedRelation {
            original: relation.clone(),
            canonical_subject_id,
            canonical_predicate: relation.predicate.clone(),
            canonical_object,
            subject_remapped,
            object_remapped,
        });
    }

    result
}

/// Keep the first relation for each canonical `subject | predicate | object` key.
///
/// Objects are stringified for the key, so the literal `true` and an entity
/// with ID `"true"` collide.
pub fn deduplicate_linked(result: &LinkingResult) -> Vec<Relation> {
    let mut seen = HashSet::new();
    result
        .linked_relations
        .iter()
        .filter(|linked| seen.insert(linked.dedup_key()))
        .map(LinkedRelation::to_relation)
        .collect()
}

/// Links relations against one resolution graph.
pub struct RelationLinker<'a> {
    erg: &'a EntityResolutionGraph,
}

impl<'a> RelationLinker<'a> {
    pub fn new(erg: &'a EntityResolutionGraph) -> Self {
        Self { erg }
    }

    /// Link `relations` and log summary counts.
    pub fn link(&self, relations: &[Relation]) -> LinkingResult {
        let result = link_relations(relations, self.erg);
        tracing::info!(
            relations = relations.len(),
            remapped = result.remapped_count,
            literals = result.literal_object_count,
            "relations linked"
        );
        result
    }

    /// Link and deduplicate in one step.
    pub fn link_and_deduplicate(&self, relations: &[Relation]) -> Vec<Relation> {
        let linked = self.link(relations);
        let deduped = deduplicate_linked(&linked);
        tracing::info!(
            kept = deduped.len(),
            dropped = linked.linked_relations.len() - deduped.len(),
            "relations deduplicated"
        );
        deduped
    }
}
