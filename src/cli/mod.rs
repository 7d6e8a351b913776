//! CLI module for icegraph.
//!
//! Subcommands:
//! - `score`: Score a timestamp and print its temporal block
//! - `categorize`: Classify an entity name
//! - `build`: Build a knowledge graph from a JSON array of documents

mod build;
mod categorize;
mod score;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use crate::error::AppError;
use crate::services::parse_timestamp;

/// icegraph - Investment research knowledge graph
#[derive(Parser)]
#[command(name = "icegraph")]
#[command(about = "Temporal freshness scoring and entity categorization for research graphs")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Score a document timestamp
    Score {
        /// RFC 3339 or RFC 2822 timestamp
        timestamp: String,

        /// Reference time (defaults to now)
        #[arg(long)]
        as_of: Option<String>,

        /// Context text, used for a quarter reference when the timestamp is unusable
        #[arg(long)]
        context: Option<String>,
    },

    /// Categorize an entity name
    Categorize {
        /// Entity name
        name: String,

        /// Surrounding text passed to the LLM
        #[arg(long)]
        context: Option<String>,

        /// Keyword confidence needed to skip the LLM
        #[arg(long)]
        threshold: Option<f32>,

        /// Never escalate to the LLM
        #[arg(long)]
        keywords_only: bool,
    },

    /// Build a knowledge graph from documents
    Build {
        /// JSON file containing an array of documents
        input: std::path::PathBuf,

        /// Reference time (defaults to now)
        #[arg(long)]
        as_of: Option<String>,

        /// Write the graph here instead of stdout
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match &self.command {
            Command::Score {
                timestamp,
                as_of,
                context,
            } => self.run_score(timestamp, as_of.as_deref(), context.as_deref()),
            Command::Categorize {
                name,
                context,
                threshold,
                keywords_only,
            } => {
                self.run_categorize(name, context.as_deref(), *threshold, *keywords_only)
                    .await
            }
            Command::Build {
                input,
                as_of,
                output,
            } => {
                self.run_build(input, as_of.as_deref(), output.as_deref())
                    .await
            }
        }
    }
}

/// Parses a user-supplied `--as-of`; unlike document timestamps, a bad value here is
/// an error.
fn parse_as_of(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, AppError> {
    raw.map(|raw| {
        parse_timestamp(raw).map_err(|source| AppError::Timestamp {
            input: raw.to_string(),
            source,
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::TimestampError;

    #[test]
    fn test_parse_cli() {
        let app = App::parse_from(["icegraph", "-v", "categorize", "NVDA", "--threshold", "0.9"]);
        assert!(app.verbose);
        assert!(matches!(
            app.command,
            Command::Categorize { ref name, threshold: Some(t), keywords_only: false, .. }
                if name == "NVDA" && t == 0.9
        ));
    }

    #[test]
    fn test_parse_as_of() {
        assert!(parse_as_of(None).unwrap().is_none());
        assert!(parse_as_of(Some("2024-05-01T00:00:00Z")).unwrap().is_some());
        assert!(matches!(
            parse_as_of(Some("2024-05-01")),
            Err(AppError::Timestamp {
                source: TimestampError::Naive,
                ..
            })
        ));
    }
}
