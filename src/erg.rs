//! The entity resolution graph: immutable result of one resolution run.
//!
//! Built in one pass: cluster → assign canonical IDs → index provenance.
//! Once built it is never mutated; it only answers lookups and hands its
//! mapping to downstream consumers.

use serde::{Deserialize, Serialize};

use crate::candidates::CandidateGenerator;
use crate::canonical::{self, CanonicalMapping};
use crate::cluster::ClusterBuilder;
use crate::config::ResolutionConfig;
use crate::diagram::{self, DiagramOptions};
use crate::embedding::EmbeddingProvider;
use crate::error::ErgResult;
use crate::model::KnowledgeGraph;
use crate::provenance::{self, MentionRecord, ProvenanceIndex};

/// Summary counts of a resolution run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErgStats {
    /// Distinct mention IDs resolved.
    pub mention_count: usize,
    /// Input relations, whether or not their endpoints resolve.
    pub relation_count: usize,
    pub cluster_count: usize,
    /// Distinct canonical IDs. Always equal to `cluster_count`.
    pub resolved_count: usize,
}

fn plural(n: usize, one: &'static str, many: &'static str) -> &'static str {
    if n == 1 { one } else { many }
}

impl std::fmt::Display for ErgStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} → {} {} ({} {})",
            self.mention_count,
            plural(self.mention_count, "mention", "mentions"),
            self.resolved_count,
            plural(self.resolved_count, "entity", "entities"),
            self.relation_count,
            plural(self.relation_count, "relation", "relations"),
        )
    }
}

/// Canonical mapping plus provenance for one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityResolutionGraph {
    canonical_mapping: CanonicalMapping,
    mentions_by_canonical: ProvenanceIndex,
    /// Canonical IDs in order of their cluster's first member.
    canonical_ids: Vec<String>,
    stats: ErgStats,
}

impl EntityResolutionGraph {
    /// Resolve a batch with the candidate strategy named in `config`.
    ///
    /// Fails only if `config` is invalid; malformed mentions or relations and
    /// embedding outages never abort a build.
    pub fn build(
        graph: &KnowledgeGraph,
        config: &ResolutionConfig,
        embedder: Option<&dyn EmbeddingProvider>,
    ) -> ErgResult<Self> {
        let mut builder = ErgBuilder::new(config);
        if let Some(embedder) = embedder {
            builder = builder.with_embedder(embedder);
        }
        builder.build(graph)
    }

    /// Canonical ID for a mention, or `None` if it was not in the batch.
    pub fn canonical_id(&self, mention_id: &str) -> Option<&str> {
        self.canonical_mapping.get(mention_id)
    }

    /// Mentions that resolved to `canonical_id`, in input order.
    ///
    /// Empty for an unknown canonical ID.
    pub fn mentions_for_entity(&self, canonical_id: &str) -> &[MentionRecord] {
        self.mentions_by_canonical
            .get(canonical_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Surface text of the representative mention of `canonical_id`.
    pub fn canonical_text(&self, canonical_id: &str) -> Option<&str> {
        self.mentions_for_entity(canonical_id)
            .iter()
            .find(|r| r.mention_id == canonical_id)
            .map(|r| r.text.as_str())
    }

    /// Canonical IDs in first-seen cluster order.
    pub fn canonical_ids(&self) -> &[String] {
        &self.canonical_ids
    }

    pub fn canonical_mapping(&self) -> &CanonicalMapping {
        &self.canonical_mapping
    }

    pub fn mentions_by_canonical(&self) -> &ProvenanceIndex {
        &self.mentions_by_canonical
    }

    pub fn stats(&self) -> ErgStats {
        self.stats
    }

    /// Number of canonical entities.
    pub fn len(&self) -> usize {
        self.canonical_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical_ids.is_empty()
    }

    /// Mermaid `graph TD` text with one node per canonical entity.
    pub fn to_diagram(&self) -> String {
        diagram::render(self, &DiagramOptions::default())
    }

    /// Mermaid text with explicit rendering options.
    pub fn to_diagram_with(&self, options: &DiagramOptions) -> String {
        diagram::render(self, options)
    }
}

/// Fluent construction of an [`EntityResolutionGraph`].
pub struct ErgBuilder<'a> {
    config: &'a ResolutionConfig,
    embedder: Option<&'a dyn EmbeddingProvider>,
    candidates: Option<&'a dyn CandidateGenerator>,
}

impl<'a> ErgBuilder<'a> {
    pub fn new(config: &'a ResolutionConfig) -> Self {
        Self {
            config,
            embedder: None,
            candidates: None,
        }
    }

    pub fn with_embedder(mut self, embedder: &'a dyn EmbeddingProvider) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Use a custom candidate-pair generator instead of `config.candidates`.
    pub fn with_candidates(mut self, candidates: &'a dyn CandidateGenerator) -> Self {
        self.candidates = Some(candidates);
        self
    }

    pub fn build(&self, graph: &KnowledgeGraph) -> ErgResult<EntityResolutionGraph> {
        self.config.validate()?;

        tracing::info!(
            entities = graph.entities.len(),
            relations = graph.relations.len(),
            threshold = self.config.similarity_threshold,
            type_gate = self.config.require_type_overlap,
            strategy = %self.config.canonical_strategy,
            vectors = self.embedder.is_some(),
            "resolving entities"
        );

        let mut clusterer = ClusterBuilder::new(self.config);
        if let Some(embedder) = self.embedder {
            clusterer = clusterer.with_embedder(embedder);
        }
        if let Some(candidates) = self.candidates {
            clusterer = clusterer.with_candidates(candidates);
        }
        let clusters = clusterer.build(graph);

        let (canonical_mapping, canonical_ids) =
            canonical::assign_all(&clusters, graph, self.config.canonical_strategy);
        let mentions_by_canonical = provenance::index(graph, &canonical_mapping);

        let stats = ErgStats {
            mention_count: canonical_mapping.len(),
            relation_count: graph.relations.len(),
            cluster_count: clusters.len(),
            resolved_count: canonical_mapping.distinct_canonical_count(),
        };
        debug_assert_eq!(stats.cluster_count, stats.resolved_count);
        debug_assert_eq!(stats.mention_count, clusters.mention_count());

        tracing::info!(
            mentions = stats.mention_count,
            entities = stats.resolved_count,
            duplicates = clusters.duplicate_count(),
            "entity resolution complete"
        );

        Ok(EntityResolutionGraph {
            canonical_mapping,
            mentions_by_canonical,
            canonical_ids,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CanonicalStrategy;
    use crate::error::{ConfigError, ErgError};
    use crate::model::{EntityMention, Relation};

    fn team(id: &str, text: &str) -> EntityMention {
        EntityMention::new(id, text).with_type("ex:Team")
    }

    fn sample() -> KnowledgeGraph {
        KnowledgeGraph::from_entities(
            vec![
                team("arsenal_0", "Arsenal"),
                team("tottenham_0", "Tottenham"),
                team("arsenal_2", "arsenal"),
            ],
            vec![Relation::new("arsenal_0", "ex:opponent", "tottenham_0")],
        )
    }

    #[test]
    fn stats_are_consistent() {
        let erg = EntityResolutionGraph::build(&sample(), &ResolutionConfig::default(), None).unwrap();
        let stats = erg.stats();
        assert_eq!(stats.mention_count, 3);
        assert_eq!(stats.relation_count, 1);
        assert_eq!(stats.cluster_count, 2);
        assert_eq!(stats.resolved_count, 2);
        assert_eq!(erg.len(), 2);
        assert_eq!(stats.to_string(), "3 mentions → 2 entities (1 relation)");
    }

    #[test]
    fn stats_display_pluralizes_counts() {
        let one = ErgStats {
            mention_count: 1,
            relation_count: 0,
            cluster_count: 1,
            resolved_count: 1,
        };
        assert_eq!(one.to_string(), "1 mention → 1 entity (0 relations)");
        assert_eq!(ErgStats::default().to_string(), "0 mentions → 0 entities (0 relations)");
    }

    #[test]
    fn unknown_lookups_are_empty_not_errors() {
        let erg = EntityResolutionGraph::build(&sample(), &ResolutionConfig::default(), None).unwrap();
        assert_eq!(erg.canonical_id("chelsea_9"), None);
        assert!(erg.mentions_for_entity("chelsea_9").is_empty());
        assert!(erg.mentions_for_entity("arsenal_2").is_empty(), "not a canonical ID");
        assert_eq!(erg.canonical_text("chelsea_9"), None);
    }

    #[test]
    fn canonical_lookups() {
        let erg = EntityResolutionGraph::build(&sample(), &ResolutionConfig::default(), None).unwrap();
        assert_eq!(erg.canonical_id("arsenal_2"), Some("arsenal_0"));
        assert_eq!(erg.canonical_text("arsenal_0"), Some("Arsenal"));
        assert_eq!(erg.canonical_ids(), ["arsenal_0", "tottenham_0"]);
        let records = erg.mentions_for_entity("arsenal_0");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].chunk_index, 2);
    }

    #[test]
    fn invalid_literal_config_fails_fast() {
        let config = ResolutionConfig {
            similarity_threshold: 1.5,
            ..Default::default()
        };
        let err = EntityResolutionGraph::build(&sample(), &config, None).unwrap_err();
        assert!(matches!(
            err,
            ErgError::Config(ConfigError::ThresholdOutOfRange { .. })
        ));
    }

    #[test]
    fn blocking_without_type_gate_fails_fast() {
        let config = ResolutionConfig {
            require_type_overlap: false,
            candidates: crate::config::CandidateStrategy::TypeBlocking,
            ..Default::default()
        };
        let err = EntityResolutionGraph::build(&sample(), &config, None).unwrap_err();
        assert!(matches!(
            err,
            ErgError::Config(ConfigError::BlockingWithoutTypeGate)
        ));
    }

    #[test]
    fn build_is_deterministic() {
        let config =
            ResolutionConfig::default().with_canonical_strategy(CanonicalStrategy::LongestMention);
        let a = EntityResolutionGraph::build(&sample(), &config, None).unwrap();
        let b = EntityResolutionGraph::build(&sample(), &config, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_batch_builds_empty_graph() {
        let erg =
            EntityResolutionGraph::build(&KnowledgeGraph::new(), &ResolutionConfig::default(), None)
                .unwrap();
        assert!(erg.is_empty());
        assert_eq!(erg.stats(), ErgStats::default());
    }

    #[test]
    fn serializes_for_the_api_layer() {
        let erg = EntityResolutionGraph::build(&sample(), &ResolutionConfig::default(), None).unwrap();
        let json = serde_json::to_value(&erg).unwrap();
        assert_eq!(json["canonical_mapping"]["arsenal_2"], "arsenal_0");
        assert_eq!(json["stats"]["cluster_count"], 2);
        assert_eq!(json["mentions_by_canonical"]["arsenal_0"][1]["text"], "arsenal");
    }
}
