//! Regex entity extraction over document text.
//!
//! Finds tickers, analyst ratings, price targets and headline financial metrics.
//! Identifiers are deterministic: tickers are shared across documents
//! (`ticker:NVDA`), per-document observations are keyed by document and position.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::models::{Edge, Entity, EntityKind, RelationKind, SourceDocument};

static CASHTAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([A-Z]{1,5})\b").expect("Invalid cashtag regex"));

static EXCHANGE_TICKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:NASDAQ|NYSE|AMEX)\s*:\s*([A-Z]{1,5})\b").expect("Invalid exchange regex")
});

static RATING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(STRONG BUY|BUY|SELL|HOLD|OUTPERFORM|UNDERPERFORM|OVERWEIGHT|UNDERWEIGHT|NEUTRAL)\b")
        .expect("Invalid rating regex")
});

static PRICE_TARGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:price target|target price|PT)\b\s*(?:of|to|at|:)?\s*\$\s?(\d+(?:\.\d+)?)")
        .expect("Invalid price target regex")
});

static METRIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(revenue|sales|eps|earnings per share|gross margin|operating margin|ebitda|net income|free cash flow|guidance)\b[^$\d]{0,40}?(\$\s?)?(\d+(?:\.\d+)?)\s*(%|percent\b|billion\b|bn\b|million\b|mm\b|[bm]\b)?",
    )
    .expect("Invalid metric regex")
});

const TICKER_CONFIDENCE: f32 = 0.95;
const RATING_CONFIDENCE: f32 = 0.85;
const PRICE_TARGET_CONFIDENCE: f32 = 0.85;
const METRIC_CONFIDENCE: f32 = 0.80;

/// Entities and edges found in one document.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub entities: Vec<Entity>,
    pub edges: Vec<Edge>,
}

/// Extracts entities from `document.text`, each tagged with its source and the
/// sentence it was found in.
///
/// When the document names exactly one ticker, that ticker is linked to every
/// metric (`HAS_METRIC`) and rating (`RATED`) found.
pub fn extract(document: &SourceDocument) -> Extraction {
    let Some(text) = document.text.as_deref() else {
        return Extraction::default();
    };

    let mut tickers: Vec<Entity> = Vec::new();
    let mut seen_tickers = HashSet::new();
    let mut observations: Vec<Entity> = Vec::new();

    for sentence in sentences(text) {
        let found = CASHTAG
            .captures_iter(sentence)
            .chain(EXCHANGE_TICKER.captures_iter(sentence));
        for caps in found {
            let symbol = &caps[1];
            if seen_tickers.insert(symbol.to_string()) {
                tickers.push(
                    Entity::new(format!("ticker:{symbol}"), symbol, EntityKind::Ticker)
                        .with_context(sentence)
                        .with_confidence(TICKER_CONFIDENCE)
                        .with_source(&document.id, document.kind),
                );
            }
        }

        for caps in RATING.captures_iter(sentence) {
            let rating = caps[1].to_string();
            let id = format!("rating:{}:{}", document.id, observations.len());
            observations.push(
                Entity::new(id, format!("{rating} rating"), EntityKind::Rating { rating })
                    .with_context(sentence)
                    .with_confidence(RATING_CONFIDENCE)
                    .with_source(&document.id, document.kind),
            );
        }

        for caps in PRICE_TARGET.captures_iter(sentence) {
            let id = format!("metric:price_target:{}:{}", document.id, observations.len());
            let kind = EntityKind::Metric {
                metric_type: "price_target".to_string(),
                value: caps[1].parse().ok(),
                unit: Some("USD".to_string()),
            };
            observations.push(
                Entity::new(id, "price target", kind)
                    .with_context(sentence)
                    .with_confidence(PRICE_TARGET_CONFIDENCE)
                    .with_source(&document.id, document.kind),
            );
        }

        for caps in METRIC.captures_iter(sentence) {
            let metric_type = normalize_metric(&caps[1]);
            let id = format!("metric:{metric_type}:{}:{}", document.id, observations.len());
            let kind = EntityKind::Metric {
                value: caps[3].parse().ok(),
                unit: metric_unit(&caps),
                metric_type,
            };
            observations.push(
                Entity::new(id, caps[1].to_lowercase(), kind)
                    .with_context(sentence)
                    .with_confidence(METRIC_CONFIDENCE)
                    .with_source(&document.id, document.kind),
            );
        }
    }

    let mut edges = Vec::new();
    if let [ticker] = tickers.as_slice() {
        for observation in &observations {
            let kind = match observation.kind {
                EntityKind::Metric { .. } => RelationKind::HasMetric,
                EntityKind::Rating { .. } => RelationKind::Rated,
                _ => continue,
            };
            let mut edge = Edge::new(&ticker.id, &observation.id, kind)
                .with_confidence(ticker.confidence.min(observation.confidence));
            if let Some(context) = &observation.context {
                edge = edge.with_context(context.clone());
            }
            edges.push(edge);
        }
    }

    tracing::debug!(
        document = %document.id,
        tickers = tickers.len(),
        observations = observations.len(),
        edges = edges.len(),
        "extracted entities"
    );

    let mut entities = tickers;
    entities.extend(observations);
    Extraction { entities, edges }
}

/// Splits on sentence-ending punctuation followed by whitespace, and on newlines.
/// Decimal points (`$4.25`) do not split.
fn sentences(text: &str) -> impl Iterator<Item = &str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let boundary = match c {
            '\n' => true,
            '.' | '!' | '?' => chars.peek().map_or(true, |(_, next)| next.is_whitespace()),
            _ => false,
        };
        if boundary {
            let end = i + c.len_utf8();
            pieces.push(&text[start..end]);
            start = end;
        }
    }
    pieces.push(&text[start..]);
    pieces.into_iter().map(str::trim).filter(|s| !s.is_empty())
}

fn normalize_metric(raw: &str) -> String {
    match raw.to_lowercase().as_str() {
        "sales" => "revenue".to_string(),
        "earnings per share" => "eps".to_string(),
        other => other.replace(' ', "_"),
    }
}

fn metric_unit(caps: &Captures<'_>) -> Option<String> {
    let dollars = caps.get(2).is_some();
    let unit = match caps.get(4).map(|m| m.as_str().to_lowercase()).as_deref() {
        Some("%") | Some("percent") => "%",
        Some("billion") | Some("bn") | Some("b") => "USD bn",
        Some("million") | Some("mm") | Some("m") => "USD mm",
        _ if dollars => "USD",
        _ => return None,
    };
    Some(unit.to_string())
}
