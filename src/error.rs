//! Application error types.
//!
//! The scoring and categorization core never returns these: its failure modes degrade
//! to "unknown" freshness or a flagged keyword fallback. `AppError` covers the edges of
//! the crate (configuration, file I/O, JSON, building the LLM provider).

use thiserror::Error;

use crate::llm::ProviderError;

/// Application-level errors for icegraph.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("LLM provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Invalid timestamp '{input}': {source}")]
    Timestamp {
        input: String,
        #[source]
        source: crate::services::TimestampError,
    },
}

impl AppError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
