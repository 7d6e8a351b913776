//! LLM provider abstraction and the classification seam used by the categorizer.
//!
//! `LlmProvider` is an enum over concrete backends; add a variant plus a module in
//! `providers/` for each new one. The categorizer never sees the provider directly:
//! it talks to a [`CategoryClassifier`], which tests replace with a fake.

pub mod providers;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Category;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("provider returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("provider response unusable: {0}")]
    Response(String),
}

/// Token accounting reported by the provider, when available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LlmUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// A single completion.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub usage: Option<LlmUsage>,
}

/// Classifies an entity into one label of a fixed vocabulary.
///
/// Implementations return the raw label text; the caller validates it against the
/// vocabulary and treats anything else as a failure.
#[async_trait]
pub trait CategoryClassifier: Send + Sync {
    async fn classify(
        &self,
        name: &str,
        context: &str,
        vocabulary: &[Category],
    ) -> Result<String, ProviderError>;
}

/// All available provider backends.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// Send `content` (and an optional system prompt) and return the reply.
    pub async fn complete(
        &self,
        content: &str,
        system: Option<&str>,
    ) -> Result<LlmResponse, ProviderError> {
        match self {
            LlmProvider::OpenAiCompatible(p) => p.complete(content, system).await,
        }
    }
}

const CLASSIFY_SYSTEM_PROMPT: &str = "You classify named entities found in investment research \
documents (emails, SEC filings, analyst notes, news). Answer with exactly one category name \
from the list you are given, copied verbatim, and nothing else.";

/// Builds the user prompt for a classification request.
pub fn classification_prompt(name: &str, context: &str, vocabulary: &[Category]) -> String {
    let mut prompt = format!("Entity: {name}\n");
    if !context.trim().is_empty() {
        prompt.push_str(&format!("Context: {}\n", context.trim()));
    }
    prompt.push_str("\nCategories:\n");
    for category in vocabulary {
        prompt.push_str(&format!("- {}: {}\n", category, category.description()));
    }
    prompt.push_str("\nCategory:");
    prompt
}

/// Pulls the label out of a reply: first non-empty line, without list markers,
/// quotes, or a trailing period.
pub fn extract_label(reply: &str) -> &str {
    reply
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
        .trim_start_matches(['-', '*', ' '])
        .trim_start_matches("Category:")
        .trim()
        .trim_matches(['"', '\'', '`', '.'])
        .trim()
}

#[async_trait]
impl CategoryClassifier for LlmProvider {
    async fn classify(
        &self,
        name: &str,
        context: &str,
        vocabulary: &[Category],
    ) -> Result<String, ProviderError> {
        let prompt = classification_prompt(name, context, vocabulary);
        let response = self.complete(&prompt, Some(CLASSIFY_SYSTEM_PROMPT)).await?;
        if let Some(usage) = response.usage {
            tracing::trace!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "classification usage"
            );
        }
        Ok(extract_label(&response.text).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_vocabulary() {
        let prompt = classification_prompt(
            "Silicon Valley expansion",
            "NVIDIA announced a Silicon Valley expansion.",
            Category::all(),
        );
        assert!(prompt.starts_with("Entity: Silicon Valley expansion\n"));
        assert!(prompt.contains("Context: NVIDIA announced"));
        for category in Category::all() {
            assert!(prompt.contains(&format!("- {}:", category)));
        }
    }

    #[test]
    fn test_prompt_omits_empty_context() {
        let prompt = classification_prompt("NVDA", "  ", &[Category::Company]);
        assert!(!prompt.contains("Context:"));
    }

    #[test]
    fn test_extract_label() {
        assert_eq!(extract_label("Geographic"), "Geographic");
        assert_eq!(extract_label("\n  \"Industry/Sector\".\n"), "Industry/Sector");
        assert_eq!(extract_label("- Company\nbecause it is"), "Company");
        assert_eq!(extract_label("Category: Person"), "Person");
        assert_eq!(extract_label(""), "");
    }
}
