//! Graph builder: documents in, knowledge graph out.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::context::Context;
use crate::di::FromContext;
use crate::models::{EdgeWrite, Entity, GraphNode, KnowledgeGraph, SourceDocument};
use crate::services::{extract, parse_timestamp, HybridCategorizer, TemporalEnhancer};

/// Assembles a [`KnowledgeGraph`] from source documents.
///
/// Per document: resolve the timestamp, merge supplied and extracted entities,
/// categorize, enhance, then upsert nodes and edges. Temporal edges are synthesized
/// once over the finished node set, so metric evolution spans documents.
#[derive(FromContext, Clone)]
pub struct GraphBuilder {
    enhancer: TemporalEnhancer,
    categorizer: HybridCategorizer,
}

impl GraphBuilder {
    pub fn new(enhancer: TemporalEnhancer, categorizer: HybridCategorizer) -> Self {
        Self {
            enhancer,
            categorizer,
        }
    }

    pub async fn ingest(
        &self,
        documents: &[SourceDocument],
        as_of: Option<DateTime<Utc>>,
    ) -> KnowledgeGraph {
        let as_of = Some(as_of.unwrap_or_else(Utc::now));
        let mut graph = KnowledgeGraph::new();

        for document in documents {
            self.ingest_document(&mut graph, document, as_of).await;
        }

        let nodes: Vec<_> = graph.nodes().map(|n| n.entity.clone()).collect();
        let synthesized = self.enhancer.create_temporal_edges(&nodes, as_of);
        let mut added = 0;
        for edge in synthesized {
            if matches!(
                graph.add_edge(edge),
                EdgeWrite::Inserted | EdgeWrite::Replaced
            ) {
                added += 1;
            }
        }

        let stats = graph.stats();
        tracing::info!(
            documents = documents.len(),
            nodes = stats.nodes,
            edges = stats.edges,
            temporal_edges = added,
            unknown_freshness = stats.unknown_freshness,
            "graph built"
        );
        graph
    }

    async fn ingest_document(
        &self,
        graph: &mut KnowledgeGraph,
        document: &SourceDocument,
        as_of: Option<DateTime<Utc>>,
    ) {
        let timestamp = match document.timestamp.as_deref().map(parse_timestamp) {
            Some(Ok(ts)) => Some(ts),
            Some(Err(e)) => {
                tracing::warn!(
                    document = %document.id,
                    error = %e,
                    "unusable document timestamp, falling back to quarter references"
                );
                None
            }
            None => {
                tracing::debug!(document = %document.id, "document has no timestamp");
                None
            }
        };

        let entities = collect_entities(document);
        let mut edges = document.edges.clone();
        let extraction = extract(document);
        edges.extend(extraction.edges);
        let entities: Vec<Entity> = entities.into_iter().chain(extraction.entities).fold(
            Vec::new(),
            |mut acc, entity| {
                if !acc.iter().any(|e: &Entity| e.id == entity.id) {
                    acc.push(entity);
                }
                acc
            },
        );

        let labels = self
            .categorizer
            .categorize_many(
                entities
                    .iter()
                    .map(|e| (e.name.as_str(), e.context.as_deref())),
                None,
            )
            .await;

        for (entity, label) in entities.iter().zip(labels) {
            let enhanced = self.enhancer.enhance_entity(entity, timestamp, as_of);
            graph.upsert_node(GraphNode::new(enhanced, Some(label)));
        }

        for edge in &edges {
            let enhanced = self.enhancer.enhance_edge(edge, timestamp, None, as_of);
            if graph.add_edge(enhanced) == EdgeWrite::DanglingEndpoint {
                tracing::warn!(
                    document = %document.id,
                    source = %edge.source,
                    target = %edge.target,
                    relationship = %edge.kind,
                    "dropping edge with unknown endpoint"
                );
            }
        }
    }
}

/// Upstream entities, tagged with this document as source where they carry none.
/// Duplicate identifiers keep the first occurrence.
fn collect_entities(document: &SourceDocument) -> Vec<Entity> {
    let mut seen = HashSet::new();
    document
        .entities
        .iter()
        .filter(|e| seen.insert(e.id.as_str()))
        .map(|e| match e.source {
            Some(_) => e.clone(),
            None => e.clone().with_source(&document.id, document.kind),
        })
        .collect()
}
