//! LLM provider implementations.
//!
//! `build(config)` is the factory, called once when the context is created.

pub mod openai_compatible;

use crate::config::LlmConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Construct an `LlmProvider` from config.
///
/// Returns `Ok(None)` for provider `"none"`: the categorizer then never escalates and
/// reports ambiguous names as keyword fallbacks.
pub fn build(config: &LlmConfig) -> Result<Option<LlmProvider>, ProviderError> {
    match config.provider.as_str() {
        "none" | "" => Ok(None),
        "openai" | "openai-compatible" => {
            let p = openai_compatible::OpenAiCompatibleProvider::new(
                config.api_base_url.clone(),
                config.model.clone(),
                config.temperature,
                config.timeout_seconds,
                config.api_key.clone(),
            )?;
            Ok(Some(LlmProvider::OpenAiCompatible(p)))
        }
        other => Err(ProviderError::UnknownProvider(other.to_string())),
    }
}
