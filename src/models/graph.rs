//! In-memory knowledge graph assembled from enhanced entities and edges.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::{CategoryLabel, EnhancedEdge, EnhancedEntity};

/// A graph node: an enhanced entity plus its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    #[serde(flatten)]
    pub entity: EnhancedEntity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryLabel>,
}

impl GraphNode {
    pub fn new(entity: EnhancedEntity, category: Option<CategoryLabel>) -> Self {
        Self { entity, category }
    }

    pub fn id(&self) -> &str {
        self.entity.id()
    }

    /// Folds a later write for the same identifier into this node.
    ///
    /// The fresher observation supplies temporal metadata and context; the more
    /// confident label wins. Returns true if anything changed.
    fn merge(&mut self, incoming: GraphNode) -> bool {
        let mut changed = false;

        let newer = match (
            self.entity.temporal().valid_from(),
            incoming.entity.temporal().valid_from(),
        ) {
            (None, Some(_)) => true,
            (Some(current), Some(next)) => next > current,
            _ => false,
        };
        if newer {
            let category = self.category.take();
            *self = GraphNode {
                entity: incoming.entity,
                category,
            };
            changed = true;
        }

        let better_label = match (&self.category, &incoming.category) {
            (None, Some(_)) => true,
            (Some(current), Some(next)) => next.confidence > current.confidence,
            _ => false,
        };
        if better_label {
            self.category = incoming.category;
            changed = true;
        }

        changed
    }
}

/// Outcome of writing a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeWrite {
    Inserted,
    Merged,
    Unchanged,
}

/// Outcome of writing an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeWrite {
    Inserted,
    /// Replaced an existing edge with the same key and lower confidence.
    Replaced,
    /// An equal-or-better edge with the same key already exists.
    Duplicate,
    /// One of the endpoints is not a node.
    DanglingEndpoint,
}

/// Counts for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub unknown_freshness: usize,
    pub edges_by_type: BTreeMap<String, usize>,
}

/// Nodes unique by identifier, edges unique by `(source, target, type)`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct KnowledgeGraph {
    nodes: BTreeMap<String, GraphNode>,
    edges: Vec<EnhancedEdge>,
    #[serde(skip)]
    edge_index: HashMap<(String, String, &'static str), usize>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the node, or merges it into the node with the same identifier.
    pub fn upsert_node(&mut self, node: GraphNode) -> NodeWrite {
        match self.nodes.get_mut(node.id()) {
            Some(existing) => {
                if existing.merge(node) {
                    NodeWrite::Merged
                } else {
                    NodeWrite::Unchanged
                }
            }
            None => {
                self.nodes.insert(node.id().to_string(), node);
                NodeWrite::Inserted
            }
        }
    }

    /// Adds an edge between existing nodes, keeping the more confident of duplicates.
    pub fn add_edge(&mut self, edge: EnhancedEdge) -> EdgeWrite {
        let inner = &edge.edge;
        if !self.nodes.contains_key(&inner.source) || !self.nodes.contains_key(&inner.target) {
            return EdgeWrite::DanglingEndpoint;
        }

        let (source, target, kind) = inner.dedup_key();
        let key = (source.to_string(), target.to_string(), kind);
        match self.edge_index.get(&key) {
            Some(&idx) => {
                if edge.edge.confidence > self.edges[idx].edge.confidence {
                    self.edges[idx] = edge;
                    EdgeWrite::Replaced
                } else {
                    EdgeWrite::Duplicate
                }
            }
            None => {
                self.edge_index.insert(key, self.edges.len());
                self.edges.push(edge);
                EdgeWrite::Inserted
            }
        }
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[EnhancedEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn stats(&self) -> GraphStats {
        let mut edges_by_type = BTreeMap::new();
        for edge in &self.edges {
            *edges_by_type
                .entry(edge.edge.kind.as_relationship().to_string())
                .or_insert(0) += 1;
        }

        GraphStats {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            unknown_freshness: self
                .nodes
                .values()
                .filter(|n| !n.entity.temporal().is_known())
                .count(),
            edges_by_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Category, Edge, EdgeMetadata, Entity, EntityKind, EntityMetadata, EntityProperties,
        FreshnessBucket, Provenance, RelationKind, Temporal, TemporalAnchor, TemporalMetadata,
    };
    use chrono::{TimeZone, Utc};

    fn node(id: &str, day: Option<u32>, context: &str) -> GraphNode {
        let temporal = match day {
            Some(d) => Temporal::Known(TemporalMetadata {
                valid_from: Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap(),
                age_days: 0,
                freshness_score: 1.0,
                freshness_bucket: FreshnessBucket::VeryFresh,
                anchor: TemporalAnchor::Document,
                period: None,
            }),
            None => Temporal::Unknown,
        };
        GraphNode::new(
            EnhancedEntity {
                entity: Entity::new(id, id, EntityKind::Ticker).with_context(context),
                metadata: EntityMetadata { temporal },
                properties: EntityProperties::default(),
            },
            None,
        )
    }

    fn label(category: Category, confidence: f32) -> CategoryLabel {
        CategoryLabel {
            category,
            confidence,
            provenance: Provenance::Keyword,
        }
    }

    fn edge(source: &str, target: &str, confidence: f32) -> EnhancedEdge {
        EnhancedEdge {
            edge: Edge::new(source, target, RelationKind::CompetesWith).with_confidence(confidence),
            metadata: EdgeMetadata {
                temporal: Temporal::Unknown,
            },
        }
    }

    #[test]
    fn test_upsert_never_duplicates() {
        let mut graph = KnowledgeGraph::new();
        assert_eq!(graph.upsert_node(node("NVDA", Some(1), "old")), NodeWrite::Inserted);
        assert_eq!(graph.upsert_node(node("NVDA", Some(5), "new")), NodeWrite::Merged);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(
            graph.node("NVDA").unwrap().entity.entity.context.as_deref(),
            Some("new")
        );
    }

    #[test]
    fn test_upsert_keeps_fresher_observation() {
        let mut graph = KnowledgeGraph::new();
        graph.upsert_node(node("NVDA", Some(5), "new"));
        assert_eq!(graph.upsert_node(node("NVDA", Some(1), "old")), NodeWrite::Unchanged);
        assert_eq!(graph.upsert_node(node("NVDA", None, "undated")), NodeWrite::Unchanged);
        assert_eq!(
            graph.node("NVDA").unwrap().entity.entity.context.as_deref(),
            Some("new")
        );
    }

    #[test]
    fn test_upsert_known_replaces_unknown() {
        let mut graph = KnowledgeGraph::new();
        graph.upsert_node(node("NVDA", None, "undated"));
        graph.upsert_node(node("NVDA", Some(1), "dated"));
        assert!(graph.node("NVDA").unwrap().entity.temporal().is_known());
    }

    #[test]
    fn test_upsert_keeps_more_confident_label() {
        let mut graph = KnowledgeGraph::new();
        let mut first = node("NVDA", Some(1), "a");
        first.category = Some(label(Category::Company, 0.85));
        graph.upsert_node(first);

        let mut weaker = node("NVDA", Some(2), "b");
        weaker.category = Some(label(Category::TechnologyProduct, 0.5));
        graph.upsert_node(weaker);

        let stored = graph.node("NVDA").unwrap();
        assert_eq!(stored.category.as_ref().unwrap().category, Category::Company);
        assert_eq!(stored.entity.entity.context.as_deref(), Some("b"));
    }

    #[test]
    fn test_add_edge_dedups_by_key() {
        let mut graph = KnowledgeGraph::new();
        graph.upsert_node(node("NVDA", Some(1), "a"));
        graph.upsert_node(node("AMD", Some(1), "b"));

        assert_eq!(graph.add_edge(edge("NVDA", "AMD", 0.6)), EdgeWrite::Inserted);
        assert_eq!(graph.add_edge(edge("NVDA", "AMD", 0.5)), EdgeWrite::Duplicate);
        assert_eq!(graph.add_edge(edge("NVDA", "AMD", 0.9)), EdgeWrite::Replaced);
        assert_eq!(graph.add_edge(edge("AMD", "NVDA", 0.9)), EdgeWrite::Inserted);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.edges()[0].edge.confidence, 0.9);
    }

    #[test]
    fn test_add_edge_rejects_dangling() {
        let mut graph = KnowledgeGraph::new();
        graph.upsert_node(node("NVDA", Some(1), "a"));
        assert_eq!(graph.add_edge(edge("NVDA", "INTC", 1.0)), EdgeWrite::DanglingEndpoint);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_stats() {
        let mut graph = KnowledgeGraph::new();
        graph.upsert_node(node("NVDA", Some(1), "a"));
        graph.upsert_node(node("AMD", None, "b"));
        graph.add_edge(edge("NVDA", "AMD", 1.0));

        let stats = graph.stats();
        assert_eq!(stats.nodes, 2);
        assert_eq!(stats.edges, 1);
        assert_eq!(stats.unknown_freshness, 1);
        assert_eq!(stats.edges_by_type.get("COMPETES_WITH"), Some(&1));
    }
}
