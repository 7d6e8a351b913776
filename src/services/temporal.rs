//! Temporal enhancement of entities and edges, and synthesis of temporal edges.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::context::Context;
use crate::di::FromContext;
use crate::models::{
    Edge, EdgeMetadata, EnhancedEdge, EnhancedEntity, Entity, EntityKind, EntityMetadata,
    EntityProperties, RelationKind, Temporal, TemporalAnchor, TemporalMetadata,
};
use crate::services::{extract_quarter, FreshnessScorer};

/// Attaches `metadata.temporal` to entities and edges.
///
/// `valid_from` is resolved through an anchor chain: the source document's timestamp,
/// then the end of a quarter referenced in the context text, then unknown.
#[derive(FromContext, Clone)]
pub struct TemporalEnhancer {
    scorer: FreshnessScorer,
}

impl TemporalEnhancer {
    pub fn new(scorer: FreshnessScorer) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &FreshnessScorer {
        &self.scorer
    }

    /// Resolves the temporal block for one observation.
    ///
    /// A quarter found in `context` is recorded even when the document timestamp is
    /// the anchor. A quarter that has not ended by `as_of` is never an anchor.
    pub fn resolve(
        &self,
        document_timestamp: Option<DateTime<Utc>>,
        context: Option<&str>,
        as_of: Option<DateTime<Utc>>,
    ) -> Temporal {
        let quarter = context.and_then(extract_quarter);
        let period = quarter.map(|q| q.period());

        if let Some(valid_from) = document_timestamp {
            return Temporal::Known(self.scorer.metadata(
                valid_from,
                TemporalAnchor::Document,
                period,
                as_of,
            ));
        }

        let now = as_of.unwrap_or_else(Utc::now);
        match quarter
            .and_then(|q| q.period_end())
            .filter(|end| *end <= now)
        {
            Some(valid_from) => Temporal::Known(self.scorer.metadata(
                valid_from,
                TemporalAnchor::Quarter,
                period,
                as_of,
            )),
            None => Temporal::Unknown,
        }
    }

    /// Returns a new enhanced entity. The input is only borrowed.
    pub fn enhance_entity(
        &self,
        entity: &Entity,
        document_timestamp: Option<DateTime<Utc>>,
        as_of: Option<DateTime<Utc>>,
    ) -> EnhancedEntity {
        let temporal = self.resolve(document_timestamp, entity.context.as_deref(), as_of);
        let properties = EntityProperties {
            freshness_score: temporal.freshness_score(),
        };

        EnhancedEntity {
            entity: entity.clone(),
            metadata: EntityMetadata { temporal },
            properties,
        }
    }

    /// Returns a new enhanced edge. `context` overrides the edge's own context for
    /// quarter extraction.
    pub fn enhance_edge(
        &self,
        edge: &Edge,
        document_timestamp: Option<DateTime<Utc>>,
        context: Option<&str>,
        as_of: Option<DateTime<Utc>>,
    ) -> EnhancedEdge {
        let context = context.or(edge.context.as_deref());
        EnhancedEdge {
            edge: edge.clone(),
            metadata: EdgeMetadata {
                temporal: self.resolve(document_timestamp, context, as_of),
            },
        }
    }

    /// Synthesizes `METRIC_EVOLVED` and `TEMPORALLY_CORRELATED` edges.
    ///
    /// - Metrics of the same type (case-insensitive) are linked older → newer, once
    ///   per pair with strictly ordered `valid_from`. Equal timestamps are skipped.
    /// - Events sharing an exact `valid_from` are linked pairwise, with the smaller
    ///   identifier as source and `time_delta_days = 0`.
    ///
    /// Entities with unknown freshness take no part. The result is not deduplicated
    /// against edges from other sources.
    ///
    /// Grouping ignores the owning company: NVDA revenue and AMD revenue are linked.
    pub fn create_temporal_edges(
        &self,
        entities: &[EnhancedEntity],
        as_of: Option<DateTime<Utc>>,
    ) -> Vec<EnhancedEdge> {
        let as_of = Some(as_of.unwrap_or_else(Utc::now));

        let mut metrics: BTreeMap<String, Vec<(&EnhancedEntity, &TemporalMetadata)>> =
            BTreeMap::new();
        let mut events: BTreeMap<DateTime<Utc>, Vec<(&EnhancedEntity, &TemporalMetadata)>> =
            BTreeMap::new();

        for entity in entities {
            let Some(meta) = entity.temporal().metadata() else {
                continue;
            };
            match &entity.entity.kind {
                EntityKind::Metric { metric_type, .. } => metrics
                    .entry(metric_type.trim().to_lowercase())
                    .or_default()
                    .push((entity, meta)),
                EntityKind::Event { .. } => {
                    events.entry(meta.valid_from).or_default().push((entity, meta))
                }
                _ => {}
            }
        }

        let mut edges = Vec::new();

        for (metric_type, mut group) in metrics {
            group.sort_by(|a, b| {
                a.1.valid_from
                    .cmp(&b.1.valid_from)
                    .then_with(|| a.0.id().cmp(b.0.id()))
            });
            for (i, older) in group.iter().enumerate() {
                for newer in &group[i + 1..] {
                    if newer.1.valid_from <= older.1.valid_from || newer.0.id() == older.0.id() {
                        continue;
                    }
                    let delta = (newer.1.valid_from - older.1.valid_from).num_days();
                    edges.push(self.synthesize(
                        *older,
                        *newer,
                        RelationKind::MetricEvolved {
                            time_delta_days: delta,
                        },
                        format!("{metric_type} evolved over {delta} days"),
                        as_of,
                    ));
                }
            }
        }

        for (_, mut group) in events {
            group.sort_by(|a, b| a.0.id().cmp(b.0.id()));
            group.dedup_by(|a, b| a.0.id() == b.0.id());
            for (i, first) in group.iter().enumerate() {
                for second in &group[i + 1..] {
                    edges.push(self.synthesize(
                        *first,
                        *second,
                        RelationKind::TemporallyCorrelated { time_delta_days: 0 },
                        "events at the same time".to_string(),
                        as_of,
                    ));
                }
            }
        }

        tracing::debug!(
            entities = entities.len(),
            edges = edges.len(),
            "synthesized temporal edges"
        );
        edges
    }

    /// Builds one synthesized edge. Confidence is the weaker endpoint's; temporal
    /// metadata is anchored at the target, which is never older than the source.
    fn synthesize(
        &self,
        (source, _): (&EnhancedEntity, &TemporalMetadata),
        (target, target_meta): (&EnhancedEntity, &TemporalMetadata),
        kind: RelationKind,
        context: String,
        as_of: Option<DateTime<Utc>>,
    ) -> EnhancedEdge {
        let confidence = source.entity.confidence.min(target.entity.confidence);
        let edge = Edge::new(source.id(), target.id(), kind)
            .with_confidence(confidence)
            .with_context(context);

        EnhancedEdge {
            edge,
            metadata: EdgeMetadata {
                temporal: Temporal::Known(self.scorer.metadata(
                    target_meta.valid_from,
                    target_meta.anchor,
                    target_meta.period.clone(),
                    as_of,
                )),
            },
        }
    }
}

impl Default for TemporalEnhancer {
    fn default() -> Self {
        Self::new(FreshnessScorer::default())
    }
}
