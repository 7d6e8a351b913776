//! Scoring, categorization and graph-building services.
//!
//! Services are assembled from the [`Context`](crate::context::Context) with the
//! `FromContext` derive macro, or built directly with `new` in tests.

mod categorizer;
mod extraction;
mod freshness;
mod graph;
mod quarter;
mod temporal;

pub use categorizer::{best_keyword_match, HybridCategorizer, KeywordRule, KEYWORD_RULES};
pub use extraction::{extract, Extraction};
pub use freshness::{age_days, parse_timestamp, FreshnessScorer, TimestampError};
pub use graph::GraphBuilder;
pub use quarter::extract_quarter;
pub use temporal::TemporalEnhancer;
