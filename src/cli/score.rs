//! Score command handler.

use color_eyre::Result;

use crate::config::Config;
use crate::context::{AppClassifier, Context};
use crate::services::{parse_timestamp, TemporalEnhancer};

use super::{parse_as_of, App};

impl App {
    /// Print the temporal block for a timestamp. An unusable timestamp is not an
    /// error: the block falls back to a quarter in `context`, then to unknown.
    pub fn run_score(
        &self,
        timestamp: &str,
        as_of: Option<&str>,
        context: Option<&str>,
    ) -> Result<()> {
        let config = Config::load()?;
        let ctx = Context::new(config, AppClassifier::none());
        let enhancer: TemporalEnhancer = ctx.resolve();
        let as_of = parse_as_of(as_of)?;

        let valid_from = match parse_timestamp(timestamp) {
            Ok(ts) => Some(ts),
            Err(e) => {
                tracing::warn!(input = timestamp, error = %e, "timestamp unusable");
                None
            }
        };

        let temporal = enhancer.resolve(valid_from, context, as_of);
        println!("{}", serde_json::to_string_pretty(&temporal)?);
        Ok(())
    }
}
