//! Edge model: typed relationships between entities.

use serde::{Deserialize, Serialize};

use super::{generate_ulid, Temporal};

/// Closed set of relationship types.
///
/// `time_delta_days` exists only on the two temporal variants, which are produced
/// by edge synthesis and never by label mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    HasMetric,
    Rated,
    Mentions,
    CompetesWith,
    SuppliesTo,
    OperatesIn,
    RelatedTo,
    /// Older observation → newer observation of the same metric type.
    MetricEvolved { time_delta_days: i64 },
    /// Two events at the same instant. Direction carries no meaning.
    TemporallyCorrelated { time_delta_days: i64 },
}

impl RelationKind {
    /// Relationship type name as stored in the graph.
    pub fn as_relationship(&self) -> &'static str {
        match self {
            RelationKind::HasMetric => "HAS_METRIC",
            RelationKind::Rated => "RATED",
            RelationKind::Mentions => "MENTIONS",
            RelationKind::CompetesWith => "COMPETES_WITH",
            RelationKind::SuppliesTo => "SUPPLIES_TO",
            RelationKind::OperatesIn => "OPERATES_IN",
            RelationKind::RelatedTo => "RELATED_TO",
            RelationKind::MetricEvolved { .. } => "METRIC_EVOLVED",
            RelationKind::TemporallyCorrelated { .. } => "TEMPORALLY_CORRELATED",
        }
    }

    /// Maps a free-text relationship label from extraction onto the closed set.
    ///
    /// Labels are compared word by word, multi-word phrases first, so a stem never
    /// matches inside a longer word ("operates" is not "rates"). Unrecognized labels
    /// become `RELATED_TO`. Temporal types are never produced here.
    pub fn from_label(label: &str) -> Self {
        let lowered = label.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let joined = format!(" {} ", words.join(" "));

        let phrase = |phrases: &[&str]| phrases.iter().any(|p| joined.contains(&format!(" {p} ")));
        let word = |list: &[&str]| words.iter().any(|w| list.contains(w));
        let stem = |stems: &[&str]| words.iter().any(|w| stems.iter().any(|s| w.starts_with(s)));

        if phrase(&["operates in", "market in", "based in"]) {
            RelationKind::OperatesIn
        } else if phrase(&["customer of", "sells to"]) {
            RelationKind::SuppliesTo
        } else if word(&["metric", "metrics", "reports", "reported", "kpi", "kpis"]) {
            RelationKind::HasMetric
        } else if word(&[
            "rating", "ratings", "rated", "rates", "upgrade", "upgraded", "upgrades",
            "downgrade", "downgraded", "downgrades",
        ]) {
            RelationKind::Rated
        } else if stem(&["compet", "rival", "peer"]) {
            RelationKind::CompetesWith
        } else if stem(&["suppl", "vendor"]) {
            RelationKind::SuppliesTo
        } else if stem(&["located", "headquarter", "sector"]) {
            RelationKind::OperatesIn
        } else if stem(&["mention"]) || word(&["cites", "cited", "references", "referenced"]) {
            RelationKind::Mentions
        } else {
            RelationKind::RelatedTo
        }
    }

    pub fn time_delta_days(&self) -> Option<i64> {
        match self {
            RelationKind::MetricEvolved { time_delta_days }
            | RelationKind::TemporallyCorrelated { time_delta_days } => Some(*time_delta_days),
            _ => None,
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_relationship())
    }
}

/// A relationship as proposed by extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default = "generate_ulid")]
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub kind: RelationKind,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

fn default_confidence() -> f32 {
    1.0
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            id: generate_ulid(),
            source: source.into(),
            target: target.into(),
            kind,
            confidence: default_confidence(),
            context: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Identity used for dedup: endpoints plus relationship type name.
    pub fn dedup_key(&self) -> (&str, &str, &'static str) {
        (&self.source, &self.target, self.kind.as_relationship())
    }
}

/// `metadata` block of an enhanced edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeMetadata {
    pub temporal: Temporal,
}

/// An edge with temporal metadata attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedEdge {
    #[serde(flatten)]
    pub edge: Edge,
    pub metadata: EdgeMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_as_relationship() {
        assert_eq!(RelationKind::HasMetric.as_relationship(), "HAS_METRIC");
        assert_eq!(RelationKind::CompetesWith.as_relationship(), "COMPETES_WITH");
        assert_eq!(
            RelationKind::MetricEvolved { time_delta_days: 3 }.as_relationship(),
            "METRIC_EVOLVED"
        );
    }

    #[test]
    fn test_from_label_maps_free_text() {
        assert_eq!(RelationKind::from_label("competitor"), RelationKind::CompetesWith);
        assert_eq!(RelationKind::from_label("Supplies chips to"), RelationKind::SuppliesTo);
        assert_eq!(RelationKind::from_label("operates_in"), RelationKind::OperatesIn);
        assert_eq!(RelationKind::from_label("reported metric"), RelationKind::HasMetric);
        assert_eq!(RelationKind::from_label("analyst upgrade"), RelationKind::Rated);
        assert_eq!(RelationKind::from_label("friends with"), RelationKind::RelatedTo);
    }

    #[test]
    fn test_from_label_matches_whole_words() {
        assert_eq!(RelationKind::from_label("operates in"), RelationKind::OperatesIn);
        assert_eq!(RelationKind::from_label("Operates-In"), RelationKind::OperatesIn);
        assert_eq!(RelationKind::from_label("integrated with"), RelationKind::RelatedTo);
        assert_eq!(
            RelationKind::from_label("generates revenue from"),
            RelationKind::RelatedTo
        );
        assert_eq!(RelationKind::from_label("is a customer of"), RelationKind::SuppliesTo);
        assert_eq!(RelationKind::from_label("rates"), RelationKind::Rated);
        assert_eq!(RelationKind::from_label("headquartered in"), RelationKind::OperatesIn);
        assert_eq!(RelationKind::from_label("mentioned alongside"), RelationKind::Mentions);
    }

    #[test]
    fn test_from_label_never_produces_temporal_kinds() {
        for label in ["metric evolved", "temporally correlated", "evolved", "same time"] {
            assert!(RelationKind::from_label(label).time_delta_days().is_none());
        }
    }

    #[test]
    fn test_edge_serialization_only_temporal_kinds_carry_delta() {
        let edge = Edge::new("a", "b", RelationKind::CompetesWith);
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["type"], "COMPETES_WITH");
        assert!(json.get("time_delta_days").is_none());

        let edge = Edge::new("a", "b", RelationKind::MetricEvolved { time_delta_days: 91 });
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["type"], "METRIC_EVOLVED");
        assert_eq!(json["time_delta_days"], 91);
    }

    #[test]
    fn test_edge_deserializes_without_id() {
        let edge: Edge = serde_json::from_value(serde_json::json!({
            "source": "ticker:NVDA",
            "target": "ticker:AMD",
            "type": "COMPETES_WITH"
        }))
        .unwrap();
        assert!(!edge.id.is_empty());
        assert_eq!(edge.confidence, 1.0);
        assert_eq!(edge.kind, RelationKind::CompetesWith);
    }
}
