//! icegraph - Investment research knowledge graph
//!
//! Temporal freshness scoring and hybrid entity categorization for a knowledge graph
//! built from emails, filings and news.

pub mod cli;
pub mod config;
pub mod context;
pub mod di;
pub mod error;
pub mod llm;
pub mod models;
pub mod services;

// Re-export FromRef at crate root for di-macros generated code
pub use di::FromRef;
