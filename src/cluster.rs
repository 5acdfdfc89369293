//! Cluster builder: union-find over pairwise mention matches.
//!
//! Mention IDs are mapped to dense indices (first occurrence order) and each
//! index starts in its own set. Every candidate pair is scored read-only in
//! parallel; matched pairs are then unioned sequentially, so the partition is
//! the transitive closure of the match edges and independent of thread timing.
//! A↔B plus B↔C lands A, B and C in one cluster even if A and C never match.

use std::collections::HashMap;

use petgraph::unionfind::UnionFind;
use rayon::prelude::*;

use crate::candidates::{self, CandidateGenerator};
use crate::config::{CandidateStrategy, ResolutionConfig};
use crate::embedding::{EmbeddingProvider, MentionVectors};
use crate::model::{EntityMention, KnowledgeGraph};
use crate::similarity::{MatchSignal, PreparedMention, SimilarityScorer};

/// A pair of dense indices judged equivalent.
#[derive(Debug, Clone, Copy)]
struct MatchEdge {
    a: usize,
    b: usize,
    signal: MatchSignal,
}

/// A partition of the distinct mention IDs of one batch.
///
/// Clusters and their members are expressed as positions in
/// [`KnowledgeGraph::entities`], each pointing at the first occurrence of its
/// mention ID. Clusters are ordered by their first member; members ascend.
#[derive(Debug, Clone, Default)]
pub struct Clusters {
    members: Vec<Vec<usize>>,
    mention_count: usize,
    duplicate_count: usize,
    match_count: usize,
}

impl Clusters {
    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterate the clusters as input positions.
    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        self.members.iter().map(Vec::as_slice)
    }

    /// Number of distinct mention IDs partitioned.
    pub fn mention_count(&self) -> usize {
        self.mention_count
    }

    /// Input entries whose ID repeated an earlier entry.
    pub fn duplicate_count(&self) -> usize {
        self.duplicate_count
    }

    /// Number of match edges that were unioned.
    pub fn match_count(&self) -> usize {
        self.match_count
    }
}

/// Builds [`Clusters`] from a batch.
pub struct ClusterBuilder<'a> {
    config: &'a ResolutionConfig,
    embedder: Option<&'a dyn EmbeddingProvider>,
    candidates: &'a dyn CandidateGenerator,
}

impl<'a> ClusterBuilder<'a> {
    /// Lexical-only builder using the candidate strategy named in `config`.
    ///
    /// Type blocking with the type gate off falls back to all pairs.
    pub fn new(config: &'a ResolutionConfig) -> Self {
        let strategy = match config.candidates {
            CandidateStrategy::TypeBlocking if !config.require_type_overlap => {
                tracing::warn!("type blocking needs the type gate, scoring all pairs");
                CandidateStrategy::AllPairs
            }
            other => other,
        };
        Self {
            config,
            embedder: None,
            candidates: candidates::for_strategy(strategy),
        }
    }

    /// Enable the vector signal.
    pub fn with_embedder(mut self, embedder: &'a dyn EmbeddingProvider) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Override the candidate-pair generator.
    pub fn with_candidates(mut self, candidates: &'a dyn CandidateGenerator) -> Self {
        self.candidates = candidates;
        self
    }

    /// Partition the batch's mention IDs. Relations are not consulted.
    pub fn build(&self, graph: &KnowledgeGraph) -> Clusters {
        // Dense index per distinct ID, remembering its first input position.
        let mut dense_of: HashMap<&str, usize> = HashMap::new();
        let mut positions: Vec<usize> = Vec::new();
        let mut mentions: Vec<&EntityMention> = Vec::new();
        let mut duplicate_count = 0usize;
        for (pos, entry) in graph.entities.iter().enumerate() {
            let id = entry.mention.id.as_str();
            if dense_of.contains_key(id) {
                duplicate_count += 1;
                tracing::warn!(mention_id = id, position = pos, "duplicate mention ID in batch");
                continue;
            }
            dense_of.insert(id, mentions.len());
            positions.push(pos);
            mentions.push(&entry.mention);
        }
        let n = mentions.len();

        let vectors = match self.embedder {
            Some(embedder) => {
                let texts: Vec<&str> = mentions.iter().map(|m| m.mention.as_str()).collect();
                MentionVectors::fetch(embedder, &texts)
            }
            None => MentionVectors::default(),
        };

        let prepared: Vec<PreparedMention<'_>> = mentions
            .iter()
            .enumerate()
            .map(|(i, m)| PreparedMention::new(m, vectors.get(i)))
            .collect();

        let mut scorer = SimilarityScorer::new(self.config);
        if let Some(embedder) = self.embedder {
            scorer = scorer.with_embedder(embedder);
        }

        let pairs = self.candidates.candidate_pairs(&mentions);
        let edges: Vec<MatchEdge> = pairs
            .par_iter()
            .filter(|&&(a, b)| a != b && a < n && b < n)
            .filter_map(|&(a, b)| {
                scorer
                    .score_prepared(&prepared[a], &prepared[b])
                    .map(|signal| MatchEdge { a, b, signal })
            })
            .collect();

        let mut sets: UnionFind<usize> = UnionFind::new(n);
        for edge in &edges {
            tracing::debug!(
                a = %mentions[edge.a].id,
                b = %mentions[edge.b].id,
                signal = %edge.signal,
                "mentions matched"
            );
            sets.union(edge.a, edge.b);
        }

        let labels = sets.into_labeling();
        let mut cluster_of_root: HashMap<usize, usize> = HashMap::new();
        let mut members: Vec<Vec<usize>> = Vec::new();
        for (dense, root) in labels.into_iter().enumerate() {
            let slot = *cluster_of_root.entry(root).or_insert_with(|| {
                members.push(Vec::new());
                members.len() - 1
            });
            members[slot].push(positions[dense]);
        }

        tracing::info!(
            mentions = n,
            candidates = pairs.len(),
            generator = self.candidates.name(),
            matches = edges.len(),
            clusters = members.len(),
            embedded = vectors.available(),
            "clusters built"
        );

        Clusters {
            members,
            mention_count: n,
            duplicate_count,
            match_count: edges.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::TypeBlocking;
    use crate::embedding::EmbeddingResult;
    use crate::error::EmbeddingError;

    fn team(id: &str, text: &str) -> EntityMention {
        EntityMention::new(id, text).with_type("ex:Team")
    }

    fn graph(mentions: Vec<EntityMention>) -> KnowledgeGraph {
        KnowledgeGraph::from_entities(mentions, vec![])
    }

    fn ids<'g>(g: &'g KnowledgeGraph, cluster: &[usize]) -> Vec<&'g str> {
        cluster
            .iter()
            .map(|&p| g.entities[p].mention.id.as_str())
            .collect()
    }

    /// Maps known texts to fixed vectors; everything else fails.
    struct TableEmbedder(Vec<(&'static str, Vec<f32>)>);

    impl EmbeddingProvider for TableEmbedder {
        fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
            self.0
                .iter()
                .find(|(t, _)| *t == text)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| EmbeddingError::Provider {
                    message: format!("no vector for {text}"),
                })
        }
    }

    struct DownEmbedder;

    impl EmbeddingProvider for DownEmbedder {
        fn embed(&self, _text: &str) -> EmbeddingResult<Vec<f32>> {
            Err(EmbeddingError::Unavailable)
        }
    }

    #[test]
    fn every_mention_lands_in_exactly_one_cluster() {
        let g = graph(vec![
            team("a_0", "Arsenal"),
            team("t_0", "Tottenham"),
            team("a_1", "arsenal"),
            team("c_2", "Chelsea"),
        ]);
        let config = ResolutionConfig::default();
        let clusters = ClusterBuilder::new(&config).build(&g);

        assert_eq!(clusters.len(), 3);
        assert_eq!(clusters.mention_count(), 4);
        let mut seen: Vec<usize> = clusters.iter().flatten().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
        assert_eq!(ids(&g, clusters.iter().next().unwrap()), vec!["a_0", "a_1"]);
    }

    #[test]
    fn union_is_transitive_through_a_bridge() {
        // "Arsenal" ⊂ "Arsenal FC" and "FC" ⊂ "Arsenal FC", but "Arsenal" and "FC" do not match.
        let g = graph(vec![
            team("a", "Arsenal"),
            team("fc", "FC"),
            team("afc", "Arsenal FC"),
        ]);
        let config = ResolutionConfig::default();
        let clusters = ClusterBuilder::new(&config).build(&g);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters.match_count(), 2);
    }

    #[test]
    fn vector_signal_links_dissimilar_strings() {
        let g = graph(vec![team("a", "Arsenal"), team("g", "The Gunners")]);
        let config = ResolutionConfig::new(0.6, true).unwrap();
        let embedder = TableEmbedder(vec![
            ("Arsenal", vec![1.0, 0.1]),
            ("The Gunners", vec![0.9, 0.2]),
        ]);

        let lexical = ClusterBuilder::new(&config).build(&g);
        assert_eq!(lexical.len(), 2);

        let with_vectors = ClusterBuilder::new(&config).with_embedder(&embedder).build(&g);
        assert_eq!(with_vectors.len(), 1);
    }

    #[test]
    fn embedding_outage_degrades_to_lexical() {
        let g = graph(vec![
            team("a", "Arsenal"),
            team("b", "arsenal"),
            team("g", "The Gunners"),
        ]);
        let config = ResolutionConfig::new(0.6, true).unwrap();
        let clusters = ClusterBuilder::new(&config).with_embedder(&DownEmbedder).build(&g);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn partial_embedding_failure_only_skips_affected_pairs() {
        let g = graph(vec![
            team("a", "Arsenal"),
            team("g", "The Gunners"),
            team("s", "Spurs"),
            team("t", "Tottenham"),
        ]);
        let config = ResolutionConfig::new(0.9, true).unwrap();
        // "Spurs" has no vector, so it cannot link to "Tottenham".
        let embedder = TableEmbedder(vec![
            ("Arsenal", vec![1.0, 0.0]),
            ("The Gunners", vec![1.0, 0.0]),
            ("Tottenham", vec![0.0, 1.0]),
        ]);
        let clusters = ClusterBuilder::new(&config).with_embedder(&embedder).build(&g);
        assert_eq!(clusters.len(), 3);
    }

    #[test]
    fn duplicate_ids_share_one_cluster_slot() {
        let mut g = KnowledgeGraph::new();
        g.push_entity(0, team("a", "Arsenal"));
        g.push_entity(1, team("a", "Arsenal"));
        g.push_entity(1, team("t", "Tottenham"));
        let config = ResolutionConfig::default();
        let clusters = ClusterBuilder::new(&config).build(&g);
        assert_eq!(clusters.mention_count(), 2);
        assert_eq!(clusters.duplicate_count(), 1);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn type_blocking_matches_all_pairs_under_the_gate() {
        let g = graph(vec![
            team("a", "Arsenal"),
            EntityMention::new("p", "Arsenal").with_type("ex:Person"),
            team("afc", "Arsenal FC"),
            EntityMention::new("u", "arsenal"),
        ]);
        let config = ResolutionConfig::default();
        let exhaustive = ClusterBuilder::new(&config).build(&g);
        let blocked = ClusterBuilder::new(&config)
            .with_candidates(&TypeBlocking)
            .build(&g);
        let a: Vec<Vec<usize>> = exhaustive.iter().map(<[usize]>::to_vec).collect();
        let b: Vec<Vec<usize>> = blocked.iter().map(<[usize]>::to_vec).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn blocking_without_type_gate_scores_all_pairs() {
        let g = graph(vec![
            EntityMention::new("a", "Arsenal"),
            EntityMention::new("b", "arsenal"),
        ]);
        let config = ResolutionConfig::new(0.6, false)
            .unwrap()
            .with_candidates(CandidateStrategy::TypeBlocking);
        let clusters = ClusterBuilder::new(&config).build(&g);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters.match_count(), 1);
    }

    #[test]
    fn empty_batch_yields_no_clusters() {
        let config = ResolutionConfig::default();
        let clusters = ClusterBuilder::new(&config).build(&KnowledgeGraph::new());
        assert!(clusters.is_empty());
        assert_eq!(clusters.mention_count(), 0);
    }
}
