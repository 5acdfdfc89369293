//! Resolution configuration.
//!
//! Validated eagerly: a bad threshold is a caller bug and surfaces when the
//! config is constructed or loaded, never halfway through a build.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// How the representative of a cluster is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalStrategy {
    /// The member that appears first in input order.
    #[default]
    FirstSeen,
    /// The member with the longest mention text; ties go to the first seen.
    LongestMention,
    /// The member with the lexicographically smallest mention ID.
    LexicographicId,
}

impl std::fmt::Display for CanonicalStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstSeen => write!(f, "first-seen"),
            Self::LongestMention => write!(f, "longest-mention"),
            Self::LexicographicId => write!(f, "lexicographic-id"),
        }
    }
}

/// Which pairs of mentions the cluster builder scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStrategy {
    /// Every unordered pair.
    #[default]
    AllPairs,
    /// Only pairs sharing a declared type. Lossless when the type gate is on.
    TypeBlocking,
}

/// Configuration for one resolution run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Minimum cosine similarity for a vector match, in [0, 1].
    pub similarity_threshold: f32,
    /// Discard matches between mentions that share no declared type.
    pub require_type_overlap: bool,
    pub canonical_strategy: CanonicalStrategy,
    pub candidates: CandidateStrategy,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
            require_type_overlap: true,
            canonical_strategy: CanonicalStrategy::FirstSeen,
            candidates: CandidateStrategy::AllPairs,
        }
    }
}

impl ResolutionConfig {
    /// Create a validated config with default strategies.
    pub fn new(similarity_threshold: f32, require_type_overlap: bool) -> ConfigResult<Self> {
        let config = Self {
            similarity_threshold,
            require_type_overlap,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Set the vector similarity threshold, rejecting values outside [0, 1].
    pub fn with_similarity_threshold(mut self, threshold: f32) -> ConfigResult<Self> {
        self.similarity_threshold = threshold;
        self.validate()?;
        Ok(self)
    }

    pub fn with_type_overlap(mut self, require: bool) -> Self {
        self.require_type_overlap = require;
        self
    }

    pub fn with_canonical_strategy(mut self, strategy: CanonicalStrategy) -> Self {
        self.canonical_strategy = strategy;
        self
    }

    pub fn with_candidates(mut self, candidates: CandidateStrategy) -> Self {
        self.candidates = candidates;
        self
    }

    /// Check the invariants. NaN thresholds are rejected too, as is type
    /// blocking with the type gate off.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::ThresholdOutOfRange {
                value: self.similarity_threshold,
            });
        }
        if self.candidates == CandidateStrategy::TypeBlocking && !self.require_type_overlap {
            return Err(ConfigError::BlockingWithoutTypeGate);
        }
        Ok(())
    }

    /// Load and validate from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Parse and validate from a TOML string.
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".into(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }
}
