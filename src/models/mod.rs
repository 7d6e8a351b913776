//! Domain models for the knowledge graph.

mod category;
mod document;
mod edge;
mod entity;
mod graph;
mod temporal;

pub use category::{Category, CategoryLabel, Provenance};
pub use document::{DocumentKind, SourceDocument};
pub use edge::{Edge, EdgeMetadata, EnhancedEdge, RelationKind};
pub use entity::{
    generate_ulid, EnhancedEntity, Entity, EntityKind, EntityMetadata, EntityProperties,
    SourceRef,
};
pub use graph::{EdgeWrite, GraphNode, GraphStats, KnowledgeGraph, NodeWrite};
pub use temporal::{
    FiscalPeriod, FiscalQuarter, FreshnessBucket, Temporal, TemporalAnchor, TemporalMetadata,
};
