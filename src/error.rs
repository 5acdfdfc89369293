//! Rich diagnostic error types for entity resolution.
//!
//! Resolution itself never fails on well-typed input: dangling relation
//! endpoints, self-loops and embedding outages all degrade gracefully. The
//! errors here are the contract violations that must fail fast (bad
//! configuration) plus the embedding faults that providers report and the
//! builder logs and swallows. Only the former reach [`ErgError`].

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the resolution crate.
#[derive(Debug, Error, Diagnostic)]
pub enum ErgError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("similarity threshold {value} is outside [0, 1]")]
    #[diagnostic(
        code(erg::config::threshold_range),
        help(
            "The vector similarity threshold is compared against cosine scores. \
             Pick a value between 0.0 and 1.0; 0.85 is a reasonable default."
        )
    )]
    ThresholdOutOfRange { value: f32 },

    #[error("type blocking requires `require_type_overlap = true`")]
    #[diagnostic(
        code(erg::config::blocking_without_type_gate),
        help(
            "Type blocking never pairs untyped or cross-type mentions, so with the \
             type gate off it would skip pairs that can match. Enable \
             `require_type_overlap` or set `candidates = \"all_pairs\"`."
        )
    )]
    BlockingWithoutTypeGate,

    #[error("failed to read config file {path}")]
    #[diagnostic(
        code(erg::config::read),
        help("Check that the config path exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    #[diagnostic(
        code(erg::config::parse),
        help(
            "The file must be TOML with keys such as `similarity_threshold`, \
             `require_type_overlap`, `canonical_strategy` and `candidates`."
        )
    )]
    Parse { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Embedding errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EmbeddingError {
    #[error("embedding provider failed: {message}")]
    #[diagnostic(
        code(erg::embedding::provider),
        help(
            "The embedding collaborator returned an error. Resolution falls back \
             to lexical matching for the affected mentions."
        )
    )]
    Provider { message: String },

    #[error("embedding provider is unavailable")]
    #[diagnostic(
        code(erg::embedding::unavailable),
        help("Vector similarity is skipped; only exact and containment matches apply.")
    )]
    Unavailable,

    #[error("embedding batch returned {actual} vectors for {expected} texts")]
    #[diagnostic(
        code(erg::embedding::batch_length),
        help("The provider must return exactly one vector per input text, in order.")
    )]
    BatchLength { expected: usize, actual: usize },
}

/// Convenience alias for functions returning resolution results.
pub type ErgResult<T> = std::result::Result<T, ErgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_to_erg_error() {
        let err = ConfigError::ThresholdOutOfRange { value: 1.5 };
        let erg: ErgError = err.into();
        assert!(matches!(
            erg,
            ErgError::Config(ConfigError::ThresholdOutOfRange { .. })
        ));
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let msg = format!(
            "{}",
            EmbeddingError::BatchLength {
                expected: 4,
                actual: 3
            }
        );
        assert!(msg.contains('4'));
        assert!(msg.contains('3'));

        let msg = format!("{}", ConfigError::ThresholdOutOfRange { value: -0.5 });
        assert!(msg.contains("-0.5"));
    }
}
