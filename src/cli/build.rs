//! Build command handler.

use std::path::Path;

use color_eyre::Result;

use crate::config::Config;
use crate::context::Context;
use crate::error::AppError;
use crate::models::SourceDocument;
use crate::services::GraphBuilder;

use super::{parse_as_of, App};

impl App {
    /// Ingest a JSON array of documents and emit the assembled graph.
    pub async fn run_build(
        &self,
        input: &Path,
        as_of: Option<&str>,
        output: Option<&Path>,
    ) -> Result<()> {
        let as_of = parse_as_of(as_of)?;

        let raw = std::fs::read_to_string(input)
            .map_err(|e| AppError::io(input.display().to_string(), e))?;
        let documents: Vec<SourceDocument> = serde_json::from_str(&raw).map_err(AppError::from)?;
        tracing::info!(
            "Loaded {} documents from {}",
            documents.len(),
            input.display()
        );

        let config = Config::load()?;
        let ctx = Context::from_config(config)?;
        let builder: GraphBuilder = ctx.resolve();
        let graph = builder.ingest(&documents, as_of).await;

        let json = serde_json::to_string_pretty(&graph)?;
        match output {
            Some(path) => {
                std::fs::write(path, json)
                    .map_err(|e| AppError::io(path.display().to_string(), e))?;
                tracing::info!("Wrote graph to {}", path.display());
            }
            None => println!("{json}"),
        }
        Ok(())
    }
}
