//! Pairwise mention similarity.
//!
//! Three signals, tried in order and short-circuiting on the first hit:
//!
//! 1. **Exact**: normalized texts are equal
//! 2. **Containment**: either normalized text is a substring of the other
//! 3. **Vector**: cosine of the two embeddings reaches the threshold (only when
//!    both mentions have a vector)
//!
//! A fired signal is then gated on type compatibility when
//! [`ResolutionConfig::require_type_overlap`] is set.

use unicode_normalization::UnicodeNormalization;

use crate::config::ResolutionConfig;
use crate::embedding::{EmbeddingProvider, cosine_similarity};
use crate::model::EntityMention;

/// Which similarity rule matched a pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchSignal {
    Exact,
    Containment,
    /// Cosine similarity of the pair's embeddings.
    Vector(f32),
}

impl std::fmt::Display for MatchSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Containment => write!(f, "containment"),
            Self::Vector(score) => write!(f, "vector({score:.3})"),
        }
    }
}

/// Normalize mention text for lexical comparison: NFKC, trimmed, lowercased.
pub fn normalize(text: &str) -> String {
    text.nfkc().collect::<String>().trim().to_lowercase()
}

/// Lexical signal over already-normalized texts.
///
/// Empty text never matches. This departs from plain substring semantics,
/// under which `""` is contained in every text.
pub fn lexical_signal(a: &str, b: &str) -> Option<MatchSignal> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    if a == b {
        return Some(MatchSignal::Exact);
    }
    if a.contains(b) || b.contains(a) {
        return Some(MatchSignal::Containment);
    }
    None
}

/// A mention prepared for repeated comparison.
#[derive(Debug, Clone)]
pub struct PreparedMention<'a> {
    pub mention: &'a EntityMention,
    pub normalized: String,
    pub vector: Option<&'a [f32]>,
}

impl<'a> PreparedMention<'a> {
    pub fn new(mention: &'a EntityMention, vector: Option<&'a [f32]>) -> Self {
        Self {
            mention,
            normalized: normalize(&mention.mention),
            vector,
        }
    }
}

/// Scores mention pairs under one configuration.
pub struct SimilarityScorer<'a> {
    config: &'a ResolutionConfig,
    embedder: Option<&'a dyn EmbeddingProvider>,
}

impl<'a> SimilarityScorer<'a> {
    pub fn new(config: &'a ResolutionConfig) -> Self {
        Self {
            config,
            embedder: None,
        }
    }

    /// Use the provider's cosine implementation for the vector signal.
    pub fn with_embedder(mut self, embedder: &'a dyn EmbeddingProvider) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Score two prepared mentions. `None` means no match.
    pub fn score_prepared(&self, a: &PreparedMention<'_>, b: &PreparedMention<'_>) -> Option<MatchSignal> {
        let signal = lexical_signal(&a.normalized, &b.normalized).or_else(|| {
            let (va, vb) = (a.vector?, b.vector?);
            let score = match self.embedder {
                Some(e) => e.cosine_similarity(va, vb),
                None => cosine_similarity(va, vb),
            };
            (score >= self.config.similarity_threshold).then_some(MatchSignal::Vector(score))
        })?;

        if self.config.require_type_overlap && !a.mention.shares_type_with(b.mention) {
            return None;
        }
        Some(signal)
    }

    /// Score two mentions with optional embeddings.
    pub fn score(
        &self,
        a: &EntityMention,
        b: &EntityMention,
        vectors: Option<(&[f32], &[f32])>,
    ) -> Option<MatchSignal> {
        let (va, vb) = match vectors {
            Some((va, vb)) => (Some(va), Some(vb)),
            None => (None, None),
        };
        self.score_prepared(&PreparedMention::new(a, va), &PreparedMention::new(b, vb))
    }
}

/// Lexical match of two mentions under `config`, including the type gate.
pub fn matches(a: &EntityMention, b: &EntityMention, config: &ResolutionConfig) -> bool {
    SimilarityScorer::new(config).score(a, b, None).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: &str, text: &str) -> EntityMention {
        EntityMention::new(id, text).with_type("ex:Team")
    }

    fn config(require_type_overlap: bool) -> ResolutionConfig {
        ResolutionConfig::new(0.6, require_type_overlap).unwrap()
    }

    fn vecs<'v>(a: &'v [f32], b: &'v [f32]) -> Option<(&'v [f32], &'v [f32])> {
        Some((a, b))
    }

    #[test]
    fn normalize_folds_case_width_and_whitespace() {
        assert_eq!(normalize("  Arsenal FC "), "arsenal fc");
        // Fullwidth Latin folds under NFKC.
        assert_eq!(normalize("ＡＲＳＥＮＡＬ"), "arsenal");
    }

    #[test]
    fn exact_match_is_case_insensitive() {
        let scorer_config = config(true);
        let scorer = SimilarityScorer::new(&scorer_config);
        assert_eq!(
            scorer.score(&team("a", "Arsenal"), &team("b", "arsenal"), None),
            Some(MatchSignal::Exact)
        );
    }

    #[test]
    fn containment_in_either_direction() {
        let cfg = config(true);
        assert!(matches(&team("a", "Arsenal"), &team("b", "Arsenal FC"), &cfg));
        assert!(matches(&team("b", "Arsenal FC"), &team("a", "arsenal"), &cfg));
        assert!(!matches(&team("a", "Arsenal"), &team("c", "Tottenham"), &cfg));
    }

    #[test]
    fn empty_text_never_matches() {
        let cfg = config(false);
        assert!(!matches(&EntityMention::new("a", ""), &EntityMention::new("b", "Arsenal"), &cfg));
        assert!(!matches(&EntityMention::new("a", "  "), &EntityMention::new("b", " "), &cfg));
        assert_eq!(lexical_signal("", "arsenal"), None);
        assert_eq!(lexical_signal("", ""), None);
    }

    #[test]
    fn type_gate_discards_disjoint_types() {
        let cfg = config(true);
        let person = EntityMention::new("p", "Arsenal").with_type("ex:Person");
        assert!(!matches(&team("a", "Arsenal"), &person, &cfg));
        assert!(matches(&team("a", "Arsenal"), &person, &config(false)));
    }

    #[test]
    fn untyped_mentions_never_pass_the_gate() {
        let a = EntityMention::new("a", "Arsenal");
        let b = EntityMention::new("b", "Arsenal");
        assert!(!matches(&a, &b, &config(true)));
        assert!(matches(&a, &b, &config(false)));
    }

    #[test]
    fn vector_signal_respects_threshold() {
        let cfg = config(true);
        let scorer = SimilarityScorer::new(&cfg);
        let gunners = team("g", "The Gunners");
        let arsenal = team("a", "Arsenal");

        let hit = scorer.score(&gunners, &arsenal, vecs(&[1.0, 0.0], &[0.8, 0.6]));
        assert!(matches!(hit, Some(MatchSignal::Vector(s)) if (s - 0.8).abs() < 1e-6));

        let miss = scorer.score(&gunners, &arsenal, vecs(&[1.0, 0.0], &[0.0, 1.0]));
        assert_eq!(miss, None);

        // Without vectors only the lexical signals apply.
        assert_eq!(scorer.score(&gunners, &arsenal, None), None);
    }

    #[test]
    fn lexical_signal_wins_over_vector() {
        let cfg = config(true);
        let scorer = SimilarityScorer::new(&cfg);
        let signal = scorer.score(
            &team("a", "Arsenal"),
            &team("b", "ARSENAL"),
            vecs(&[1.0, 0.0], &[1.0, 0.0]),
        );
        assert_eq!(signal, Some(MatchSignal::Exact));
    }

    #[test]
    fn zero_vectors_only_clear_a_zero_threshold() {
        let cfg = ResolutionConfig::new(0.0, false).unwrap();
        let scorer = SimilarityScorer::new(&cfg);
        // Cosine of zero vectors is 0.0, which still clears a 0.0 threshold.
        let signal = scorer.score(
            &EntityMention::new("a", "Saka"),
            &EntityMention::new("b", "Martinelli"),
            vecs(&[0.0, 0.0], &[0.0, 0.0]),
        );
        assert_eq!(signal, Some(MatchSignal::Vector(0.0)));

        let strict = ResolutionConfig::new(0.6, false).unwrap();
        let scorer = SimilarityScorer::new(&strict);
        let signal = scorer.score(
            &EntityMention::new("a", "Saka"),
            &EntityMention::new("b", "Martinelli"),
            vecs(&[0.0, 0.0], &[0.0, 0.0]),
        );
        assert_eq!(signal, None);
    }
}
