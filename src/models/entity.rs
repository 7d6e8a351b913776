//! Entity model: a named thing extracted from a document.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::{DocumentKind, Temporal};

/// What kind of thing an entity is. Closed set; carries only the fields that exist
/// for that kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityKind {
    Ticker,
    Company,
    /// A financial figure. Observations of the same `metric_type` are linked over
    /// time by `METRIC_EVOLVED` edges.
    Metric {
        metric_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
    Person,
    /// A dated occurrence. Events sharing an exact timestamp are linked by
    /// `TEMPORALLY_CORRELATED` edges.
    Event { event_type: String },
    /// An analyst rating such as BUY or HOLD.
    Rating { rating: String },
    Other,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Ticker => "ticker",
            EntityKind::Company => "company",
            EntityKind::Metric { .. } => "metric",
            EntityKind::Person => "person",
            EntityKind::Event { .. } => "event",
            EntityKind::Rating { .. } => "rating",
            EntityKind::Other => "other",
        }
    }
}

/// Where an entity was extracted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub document_id: String,
    pub kind: DocumentKind,
}

/// An entity as produced by extraction. Immutable once attached to a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Identifier; graph nodes are unique by this value.
    pub id: String,
    /// Surface name ("NVIDIA Corporation", "NVDA", "revenue").
    pub name: String,
    #[serde(flatten)]
    pub kind: EntityKind,
    /// Text snippet the entity was found in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Extraction confidence, 0-1.
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceRef>,
}

fn default_confidence() -> f32 {
    1.0
}

impl Entity {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            context: None,
            confidence: default_confidence(),
            source: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_source(mut self, document_id: impl Into<String>, kind: DocumentKind) -> Self {
        self.source = Some(SourceRef {
            document_id: document_id.into(),
            kind,
        });
        self
    }

    /// The metric subtype, if this entity is a metric.
    pub fn metric_type(&self) -> Option<&str> {
        match &self.kind {
            EntityKind::Metric { metric_type, .. } => Some(metric_type),
            _ => None,
        }
    }
}

/// `metadata` block of an enhanced entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub temporal: Temporal,
}

/// `properties` block of an enhanced entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityProperties {
    /// Convenience copy of the temporal score; absent when freshness is unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness_score: Option<f64>,
}

/// An entity with temporal metadata attached. Built as a new value; the source
/// entity is left untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedEntity {
    #[serde(flatten)]
    pub entity: Entity,
    pub metadata: EntityMetadata,
    #[serde(default)]
    pub properties: EntityProperties,
}

impl EnhancedEntity {
    pub fn id(&self) -> &str {
        &self.entity.id
    }

    pub fn temporal(&self) -> &Temporal {
        &self.metadata.temporal
    }
}

/// Generates a new ULID string.
pub fn generate_ulid() -> String {
    Ulid::new().to_string()
}
