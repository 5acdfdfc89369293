// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # erg-resolve
//!
//! Entity resolution for extracted knowledge graphs. Mentions extracted
//! independently from many document chunks ("Arsenal", "arsenal",
//! "Arsenal FC") are clustered into canonical entities, relations are
//! rewritten to canonical IDs, and every mention's source chunk is kept for
//! audit.
//!
//! ## Pipeline
//!
//! - **Similarity** (`similarity`): exact, containment and optional vector signals, type-gated
//! - **Clustering** (`cluster`): union-find transitive closure over scored candidate pairs
//! - **Canonical IDs** (`canonical`): deterministic representative per cluster
//! - **Provenance** (`provenance`): per-entity mention records with chunk indices
//! - **Result** (`erg`): immutable [`erg::EntityResolutionGraph`] with lookups, stats, diagrams
//! - **Linking** (`linker`): canonical relation endpoints plus deduplication
//!
//! ## Library usage
//!
//! ```no_run
//! use erg_resolve::config::ResolutionConfig;
//! use erg_resolve::erg::EntityResolutionGraph;
//! use erg_resolve::linker::{deduplicate_linked, link_relations};
//! use erg_resolve::model::{EntityMention, KnowledgeGraph, Relation};
//!
//! let graph = KnowledgeGraph::from_entities(
//!     vec![
//!         EntityMention::new("arsenal_0", "Arsenal").with_type("ex:Team"),
//!         EntityMention::new("arsenal_fc_3", "Arsenal FC").with_type("ex:Team"),
//!     ],
//!     vec![Relation::new("arsenal_fc_3", "ex:founded", 1886.0)],
//! );
//! let config = ResolutionConfig::new(0.6, true).unwrap();
//! let erg = EntityResolutionGraph::build(&graph, &config, None).unwrap();
//! assert_eq!(erg.canonical_id("arsenal_fc_3"), Some("arsenal_0"));
//!
//! let linked = link_relations(&graph.relations, &erg);
//! let relations = deduplicate_linked(&linked);
//! ```

pub mod candidates;
pub mod canonical;
pub mod cluster;
pub mod config;
pub mod diagram;
pub mod embedding;
pub mod erg;
pub mod error;
pub mod linker;
pub mod model;
pub mod provenance;
pub mod similarity;
