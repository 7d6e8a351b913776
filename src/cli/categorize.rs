//! Categorize command handler.

use color_eyre::Result;

use crate::config::Config;
use crate::context::{AppClassifier, Context};
use crate::services::HybridCategorizer;

use super::App;

impl App {
    /// Classify one entity name and print the label as JSON.
    pub async fn run_categorize(
        &self,
        name: &str,
        context: Option<&str>,
        threshold: Option<f32>,
        keywords_only: bool,
    ) -> Result<()> {
        let config = Config::load()?;
        let ctx = if keywords_only {
            Context::new(config, AppClassifier::none())
        } else {
            Context::from_config(config)?
        };
        tracing::debug!(
            provider = %ctx.config.llm.provider,
            threshold = threshold.unwrap_or(ctx.categorizer.threshold),
            "categorizing"
        );

        let categorizer: HybridCategorizer = ctx.resolve();
        let label = if keywords_only {
            categorizer.categorize_by_keywords(name, threshold)
        } else {
            categorizer.categorize(name, context, threshold).await
        };

        println!("{}", serde_json::to_string_pretty(&label)?);
        Ok(())
    }
}
