//! Input data model: extracted mentions, relations, and the batch that holds them.
//!
//! Everything here is produced upstream by the extraction stage and consumed
//! read-only by resolution. Order within a [`KnowledgeGraph`] is significant:
//! it drives the canonical tie-break and the order of provenance records.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar attribute attached to a mention. Opaque to resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// One extracted occurrence of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMention {
    /// Identifier, unique within a batch.
    pub id: String,
    /// Raw surface text as it appeared in the source chunk.
    pub mention: String,
    /// Type URIs declared by the extractor. May be empty.
    #[serde(default)]
    pub types: BTreeSet<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl EntityMention {
    /// Create an untyped mention with no attributes.
    pub fn new(id: impl Into<String>, mention: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mention: mention.into(),
            types: BTreeSet::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Add a declared type.
    pub fn with_type(mut self, type_uri: impl Into<String>) -> Self {
        self.types.insert(type_uri.into());
        self
    }

    /// Attach an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Whether the two mentions share at least one declared type.
    ///
    /// Two empty type sets do not overlap.
    pub fn shares_type_with(&self, other: &EntityMention) -> bool {
        self.types.intersection(&other.types).next().is_some()
    }
}

/// A literal relation object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Number(f64),
}

/// Numbers use `f64` `Display`: `3.0` prints as `3`, large magnitudes print
/// positionally rather than in exponent form, and `-0.0` prints as `0`.
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) if *n == 0.0 => f.write_str("0"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// The object position of a relation: a mention reference or a literal.
///
/// In JSON a string is read as a mention ID and a number or boolean as a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationObject {
    Entity(String),
    Literal(Literal),
}

impl RelationObject {
    /// The referenced mention ID, if this object is not a literal.
    pub fn as_entity(&self) -> Option<&str> {
        match self {
            Self::Entity(id) => Some(id),
            Self::Literal(_) => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

impl fmt::Display for RelationObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity(id) => f.write_str(id),
            Self::Literal(lit) => write!(f, "{lit}"),
        }
    }
}

impl From<&str> for RelationObject {
    fn from(id: &str) -> Self {
        Self::Entity(id.to_string())
    }
}

impl From<String> for RelationObject {
    fn from(id: String) -> Self {
        Self::Entity(id)
    }
}

impl From<f64> for RelationObject {
    fn from(n: f64) -> Self {
        Self::Literal(Literal::Number(n))
    }
}

impl From<bool> for RelationObject {
    fn from(b: bool) -> Self {
        Self::Literal(Literal::Bool(b))
    }
}

impl From<Literal> for RelationObject {
    fn from(lit: Literal) -> Self {
        Self::Literal(lit)
    }
}

/// A relation between a subject mention and an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub subject_id: String,
    /// Predicate URI. Never canonicalized.
    pub predicate: String,
    pub object: RelationObject,
}

impl Relation {
    pub fn new(
        subject_id: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<RelationObject>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

/// A mention together with where it was extracted from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourcedMention {
    #[serde(flatten)]
    pub mention: EntityMention,
    /// Index of the source chunk. Carried through to provenance unchanged.
    pub chunk_index: usize,
    /// Extraction confidence, if the extractor reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// Derive a chunk index from the mention ID encoding.
///
/// Extractors name mentions `<slug>_<chunk>`, so the chunk is the decimal
/// suffix after the last `_`. Returns `None` when there is no such suffix.
pub fn chunk_index_from_id(id: &str) -> Option<usize> {
    let pos = id.rfind('_')?;
    id[pos + 1..].parse().ok()
}

/// One resolution batch: ordered mentions plus ordered relations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "KnowledgeGraphRecord")]
pub struct KnowledgeGraph {
    pub entities: Vec<SourcedMention>,
    pub relations: Vec<Relation>,
}

impl KnowledgeGraph {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a batch whose chunk indices are derived from mention IDs.
    ///
    /// Mentions without a numeric `_<chunk>` suffix get chunk 0.
    pub fn from_entities(entities: Vec<EntityMention>, relations: Vec<Relation>) -> Self {
        let entities = entities
            .into_iter()
            .map(|mention| SourcedMention {
                chunk_index: chunk_index_from_id(&mention.id).unwrap_or(0),
                mention,
                confidence: None,
            })
            .collect();
        Self {
            entities,
            relations,
        }
    }

    /// Append a mention extracted from `chunk_index`.
    pub fn push_entity(&mut self, chunk_index: usize, mention: EntityMention) -> &mut Self {
        self.entities.push(SourcedMention {
            mention,
            chunk_index,
            confidence: None,
        });
        self
    }

    /// Append a mention with an extraction confidence.
    pub fn push_scored_entity(
        &mut self,
        chunk_index: usize,
        mention: EntityMention,
        confidence: f32,
    ) -> &mut Self {
        self.entities.push(SourcedMention {
            mention,
            chunk_index,
            confidence: Some(confidence),
        });
        self
    }

    pub fn push_relation(&mut self, relation: Relation) -> &mut Self {
        self.relations.push(relation);
        self
    }

    /// Iterate the mentions in input order.
    pub fn mentions(&self) -> impl Iterator<Item = &EntityMention> {
        self.entities.iter().map(|e| &e.mention)
    }
}

/// Wire form of a mention: the chunk index may be omitted.
#[derive(Deserialize)]
struct SourcedMentionRecord {
    #[serde(flatten)]
    mention: EntityMention,
    #[serde(default)]
    chunk_index: Option<usize>,
    #[serde(default)]
    confidence: Option<f32>,
}

#[derive(Deserialize)]
struct KnowledgeGraphRecord {
    #[serde(default)]
    entities: Vec<SourcedMentionRecord>,
    #[serde(default)]
    relations: Vec<Relation>,
}

impl From<KnowledgeGraphRecord> for KnowledgeGraph {
    fn from(record: KnowledgeGraphRecord) -> Self {
        let entities = record
            .entities
            .into_iter()
            .map(|e| SourcedMention {
                chunk_index: e
                    .chunk_index
                    .or_else(|| chunk_index_from_id(&e.mention.id))
                    .unwrap_or(0),
                mention: e.mention,
                confidence: e.confidence,
            })
            .collect();
        Self {
            entities,
            relations: record.relations,
        }
    }
}
