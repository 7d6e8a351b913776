//! Source documents fed to the graph builder.

use serde::{Deserialize, Serialize};

use super::{Edge, Entity};

/// The kind of document an entity came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Email,
    SecFiling,
    Attachment,
    News,
    #[default]
    Other,
}

/// A document handed over by ingestion.
///
/// The timestamp stays a raw string so that an undated, naive, or garbled date
/// degrades that document to unknown freshness instead of failing the whole batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    pub id: String,
    #[serde(default)]
    pub kind: DocumentKind,
    /// ISO-8601 with offset, or RFC 2822 (email `Date:` header).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Body text to run extraction over.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Entities extracted upstream.
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Edges extracted upstream.
    #[serde(default)]
    pub edges: Vec<Edge>,
}
