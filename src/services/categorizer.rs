//! Hybrid entity categorization: keyword rules first, LLM for the ambiguous rest.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::CategorizerConfig;
use crate::context::{AppClassifier, Context};
use crate::di::FromContext;
use crate::models::{Category, CategoryLabel, Provenance};

/// One keyword rule. `ambiguous` rules are hints only: their confidence sits below
/// the default threshold, so a name matched by nothing stronger goes to the LLM.
#[derive(Debug)]
pub struct KeywordRule {
    pub name: &'static str,
    pub pattern: &'static str,
    pub category: Category,
    pub confidence: f32,
    pub ambiguous: bool,
}

/// Ordered rule table. Highest confidence wins; ties go to the earlier rule.
pub static KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        name: "sector_prefix",
        pattern: r"(?i)^\s*sector\s*:",
        category: Category::IndustrySector,
        confidence: 0.95,
        ambiguous: false,
    },
    KeywordRule {
        name: "company_suffix",
        pattern: r"(?i)\b(?:inc|corp|corporation|ltd|llc|plc|holdings|group|co)\b\.?\s*$",
        category: Category::Company,
        confidence: 0.90,
        ambiguous: false,
    },
    KeywordRule {
        name: "financial_metric",
        pattern: r"(?i)\b(?:revenues?|sales|eps|earnings per share|ebitda|margins?|net income|operating income|free cash flow|fcf|guidance|price target|dividends?|market cap)\b",
        category: Category::FinancialMetric,
        confidence: 0.90,
        ambiguous: false,
    },
    KeywordRule {
        name: "analyst_rating",
        pattern: r"(?i)\b(?:strong buy|buy|sell|hold|outperform|underperform|overweight|underweight|neutral)\s+rating\b",
        category: Category::MarketEvent,
        confidence: 0.85,
        ambiguous: false,
    },
    KeywordRule {
        name: "market_event",
        pattern: r"(?i)\b(?:earnings call|earnings release|conference call|investor day|acquisition|merger|ipo|stock split|buyback|secondary offering|product launch)\b",
        category: Category::MarketEvent,
        confidence: 0.85,
        ambiguous: false,
    },
    KeywordRule {
        name: "executive_title",
        pattern: r"(?i)\b(?:ceo|cfo|coo|cto|chairman|chairwoman|founder|analyst)\b",
        category: Category::Person,
        confidence: 0.85,
        ambiguous: false,
    },
    KeywordRule {
        name: "geography",
        pattern: r"(?i)\b(?:united states|usa|china|taiwan|japan|korea|india|germany|europe|asia|emea|apac|latin america|north america|california|texas|new york)\b",
        category: Category::Geographic,
        confidence: 0.85,
        ambiguous: false,
    },
    KeywordRule {
        name: "ticker",
        pattern: r"^\$?[A-Z]{1,5}$",
        category: Category::Company,
        confidence: 0.85,
        ambiguous: false,
    },
    KeywordRule {
        name: "industry",
        pattern: r"(?i)\b(?:industry|sector|banking|healthcare|biotech|utilities|automotive)\b",
        category: Category::IndustrySector,
        confidence: 0.80,
        ambiguous: false,
    },
    KeywordRule {
        name: "technology",
        pattern: r"(?i)\b(?:gpus?|cpus?|chips?|semiconductors?|data center|cloud|software|platform|cuda|h100|h200|blackwell|hopper|llm)\b",
        category: Category::TechnologyProduct,
        confidence: 0.80,
        ambiguous: false,
    },
    KeywordRule {
        name: "place_word",
        pattern: r"(?i)\b(?:valley|region|hub|corridor|bay area)\b",
        category: Category::Geographic,
        confidence: 0.60,
        ambiguous: true,
    },
    KeywordRule {
        name: "proper_noun",
        pattern: r"^[A-Z][A-Za-z&'.-]*(?:\s+[A-Z][A-Za-z&'.-]*)*",
        category: Category::Company,
        confidence: 0.50,
        ambiguous: true,
    },
];

static COMPILED_RULES: Lazy<Vec<(&'static KeywordRule, Regex)>> = Lazy::new(|| {
    KEYWORD_RULES
        .iter()
        .map(|rule| {
            let regex = Regex::new(rule.pattern).expect("Invalid keyword rule regex");
            (rule, regex)
        })
        .collect()
});

/// Best keyword match for `name`: highest confidence, earliest rule on ties.
pub fn best_keyword_match(name: &str) -> Option<&'static KeywordRule> {
    let name = name.trim();
    let mut best: Option<&'static KeywordRule> = None;
    for (rule, regex) in COMPILED_RULES.iter() {
        if regex.is_match(name) && best.map_or(true, |b| rule.confidence > b.confidence) {
            best = Some(*rule);
        }
    }
    best
}

/// A rule that may answer without the LLM: unambiguous and at or above `threshold`.
fn confident(best: Option<&'static KeywordRule>, threshold: f32) -> Option<&'static KeywordRule> {
    best.filter(|rule| !rule.ambiguous && rule.confidence >= threshold)
}

fn keyword_label(rule: &KeywordRule) -> CategoryLabel {
    CategoryLabel {
        category: rule.category,
        confidence: rule.confidence,
        provenance: Provenance::Keyword,
    }
}

/// Best keyword guess flagged as a fallback, or `Other`/0.0 when nothing matched.
fn fallback_label(best: Option<&KeywordRule>) -> CategoryLabel {
    match best {
        Some(rule) => CategoryLabel {
            category: rule.category,
            confidence: rule.confidence,
            provenance: Provenance::KeywordFallback,
        },
        None => CategoryLabel {
            category: Category::Other,
            confidence: 0.0,
            provenance: Provenance::KeywordFallback,
        },
    }
}

/// Classifies entity names into the [`Category`] vocabulary.
///
/// Keyword rules answer when they are confident enough. Below the threshold the
/// configured classifier is asked, bounded by a timeout with at most one retry. Any
/// failure falls back to the best keyword guess, flagged as `keyword_fallback`.
#[derive(FromContext, Clone)]
pub struct HybridCategorizer {
    config: Arc<CategorizerConfig>,
    classifier: AppClassifier,
}

impl HybridCategorizer {
    pub fn new(config: CategorizerConfig, classifier: AppClassifier) -> Self {
        Self {
            config: Arc::new(config),
            classifier,
        }
    }

    /// Keyword-only classification, never escalating. A match that an LLM-backed
    /// call would have escalated comes back as `keyword_fallback`.
    pub fn categorize_by_keywords(&self, name: &str, threshold: Option<f32>) -> CategoryLabel {
        let threshold = threshold.unwrap_or(self.config.threshold);
        let best = best_keyword_match(name);
        match confident(best, threshold) {
            Some(rule) => keyword_label(rule),
            None => fallback_label(best),
        }
    }

    /// Classifies one entity. `threshold` overrides the configured one.
    pub async fn categorize(
        &self,
        name: &str,
        context: Option<&str>,
        threshold: Option<f32>,
    ) -> CategoryLabel {
        let threshold = threshold.unwrap_or(self.config.threshold);
        let best = best_keyword_match(name);

        if let Some(rule) = confident(best, threshold) {
            tracing::debug!(
                name,
                rule = rule.name,
                category = %rule.category,
                confidence = rule.confidence,
                "keyword match"
            );
            return keyword_label(rule);
        }

        if let Some(category) = self.escalate(name, context.unwrap_or("")).await {
            tracing::debug!(name, %category, "LLM classification");
            return CategoryLabel {
                category,
                confidence: self.config.llm_confidence,
                provenance: Provenance::LlmEscalated,
            };
        }

        let label = fallback_label(best);
        tracing::warn!(
            name,
            category = %label.category,
            confidence = label.confidence,
            "falling back to keyword guess"
        );
        label
    }

    /// Classifies many entities with bounded concurrency, preserving input order.
    pub async fn categorize_many<'a, I>(&self, items: I, threshold: Option<f32>) -> Vec<CategoryLabel>
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        stream::iter(items)
            .map(|(name, context)| self.categorize(name, context, threshold))
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await
    }

    /// Asks the classifier. `None` on no classifier, error, timeout, or an answer
    /// outside the vocabulary.
    async fn escalate(&self, name: &str, context: &str) -> Option<Category> {
        let Some(classifier) = self.classifier.get() else {
            tracing::debug!(name, "no LLM classifier configured");
            return None;
        };

        let limit = Duration::from_secs(self.config.llm_timeout_seconds);
        let attempts = 1 + self.config.effective_retries();

        for attempt in 1..=attempts {
            let call = classifier.classify(name, context, Category::all());
            match tokio::time::timeout(limit, call).await {
                Ok(Ok(answer)) => {
                    return match answer.parse::<Category>() {
                        Ok(category) => Some(category),
                        Err(_) => {
                            tracing::warn!(name, answer = %answer, "LLM answer outside vocabulary");
                            None
                        }
                    };
                }
                Ok(Err(e)) => {
                    tracing::warn!(name, attempt, error = %e, "LLM classification failed")
                }
                Err(_) => tracing::warn!(
                    name,
                    attempt,
                    timeout_seconds = self.config.llm_timeout_seconds,
                    "LLM classification timed out"
                ),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CategoryClassifier, ProviderError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted classifier: pops one reply per call, counting calls.
    struct MockClassifier {
        replies: std::sync::Mutex<Vec<Result<String, ProviderError>>>,
        calls: Arc<AtomicUsize>,
        delay: Option<Duration>,
    }

    impl MockClassifier {
        fn new(replies: Vec<Result<String, ProviderError>>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let mock = Self {
                replies: std::sync::Mutex::new(replies.into_iter().rev().collect()),
                calls: calls.clone(),
                delay: None,
            };
            (mock, calls)
        }

        fn answering(answer: &str) -> (Self, Arc<AtomicUsize>) {
            Self::new((0..8).map(|_| Ok(answer.to_string())).collect())
        }
    }

    #[async_trait]
    impl CategoryClassifier for MockClassifier {
        async fn classify(
            &self,
            _name: &str,
            _context: &str,
            vocabulary: &[Category],
        ) -> Result<String, ProviderError> {
            assert_eq!(vocabulary, Category::all());
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(ProviderError::Response("script exhausted".into())))
        }
    }

    fn categorizer(mock: MockClassifier) -> HybridCategorizer {
        HybridCategorizer::new(CategorizerConfig::default(), AppClassifier::new(mock))
    }

    fn failure() -> Result<String, ProviderError> {
        Err(ProviderError::Http {
            status: 503,
            message: "overloaded".into(),
        })
    }

    #[test]
    fn test_rule_table_confidence_bands() {
        let threshold = CategorizerConfig::default().threshold;
        for rule in KEYWORD_RULES {
            if rule.ambiguous {
                assert!(rule.confidence < threshold, "{} should escalate", rule.name);
            } else {
                assert!(rule.confidence >= 0.80, "{} too weak", rule.name);
            }
            assert!(Regex::new(rule.pattern).is_ok(), "{} pattern", rule.name);
        }
    }

    #[test]
    fn test_best_keyword_match() {
        let rule = |name: &str| best_keyword_match(name).map(|r| r.name);
        assert_eq!(rule("NVIDIA Corporation"), Some("company_suffix"));
        assert_eq!(rule("Apple Inc."), Some("company_suffix"));
        assert_eq!(rule("NVDA"), Some("ticker"));
        assert_eq!(rule("$AMD"), Some("ticker"));
        // Metric beats ticker shape.
        assert_eq!(rule("EPS"), Some("financial_metric"));
        assert_eq!(rule("Sector: Semiconductors"), Some("sector_prefix"));
        assert_eq!(rule("H100"), Some("technology"));
        assert_eq!(rule("Taiwan"), Some("geography"));
        // Region abbreviations share the ticker shape.
        assert_eq!(rule("APAC"), Some("geography"));
        assert_eq!(rule("EMEA"), Some("geography"));
        assert_eq!(rule("USA"), Some("geography"));
        assert_eq!(rule("BUY rating"), Some("analyst_rating"));
        assert_eq!(rule("Jensen Huang, CEO"), Some("executive_title"));
        // Tie at 0.80 between industry and technology goes to the earlier rule.
        assert_eq!(rule("semiconductor industry"), Some("industry"));
        assert_eq!(rule("Silicon Valley expansion"), Some("place_word"));
        assert_eq!(rule("expansion"), None);
    }

    #[tokio::test]
    async fn test_confident_keyword_skips_llm() {
        let (mock, calls) = MockClassifier::answering("Other");
        let label = categorizer(mock)
            .categorize("NVIDIA Corporation", None, None)
            .await;

        assert_eq!(label.category, Category::Company);
        assert!(label.confidence >= 0.80);
        assert_eq!(label.provenance, Provenance::Keyword);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ambiguous_name_escalates_once() {
        let (mock, calls) = MockClassifier::answering("Geographic");
        let label = categorizer(mock)
            .categorize(
                "Silicon Valley expansion",
                Some("NVIDIA announced a Silicon Valley expansion."),
                None,
            )
            .await;

        assert_eq!(label.category, Category::Geographic);
        assert_eq!(label.confidence, 0.90);
        assert_eq!(label.provenance, Provenance::LlmEscalated);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_threshold_override() {
        let (mock, calls) = MockClassifier::answering("Technology/Product");
        let c = categorizer(mock);

        let label = c.categorize("NVDA", None, Some(0.95)).await;
        assert_eq!(label.provenance, Provenance::LlmEscalated);
        assert_eq!(label.category, Category::TechnologyProduct);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let label = c.categorize("Taiwan", None, Some(0.5)).await;
        assert_eq!(label.provenance, Provenance::Keyword);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Ambiguous rules never answer on their own, whatever the threshold.
        let label = c.categorize("Silicon Valley expansion", None, Some(0.5)).await;
        assert_eq!(label.provenance, Provenance::LlmEscalated);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_keywords_only_flags_weak_matches() {
        let c = HybridCategorizer::new(CategorizerConfig::default(), AppClassifier::none());

        let label = c.categorize_by_keywords("NVIDIA Corporation", None);
        assert_eq!(label.category, Category::Company);
        assert_eq!(label.provenance, Provenance::Keyword);

        let label = c.categorize_by_keywords("Silicon Valley expansion", None);
        assert_eq!(label.category, Category::Geographic);
        assert_eq!(label.confidence, 0.60);
        assert_eq!(label.provenance, Provenance::KeywordFallback);

        let label = c.categorize_by_keywords("Acme Widgets", Some(0.1));
        assert_eq!(label.category, Category::Company);
        assert_eq!(label.provenance, Provenance::KeywordFallback);

        let label = c.categorize_by_keywords("Taiwan", Some(0.9));
        assert_eq!(label.provenance, Provenance::KeywordFallback);

        let label = c.categorize_by_keywords("expansion", None);
        assert_eq!(label.category, Category::Other);
        assert_eq!(label.confidence, 0.0);
        assert_eq!(label.provenance, Provenance::KeywordFallback);
    }

    #[tokio::test]
    async fn test_retry_once_then_succeed() {
        let (mock, calls) = MockClassifier::new(vec![failure(), Ok("Company".into())]);
        let label = categorizer(mock).categorize("Acme Widgets", None, None).await;

        assert_eq!(label.provenance, Provenance::LlmEscalated);
        assert_eq!(label.category, Category::Company);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_best_keyword() {
        let (mock, calls) = MockClassifier::new(vec![failure(), failure(), failure()]);
        let label = categorizer(mock)
            .categorize("Silicon Valley expansion", None, None)
            .await;

        assert_eq!(label.category, Category::Geographic);
        assert_eq!(label.confidence, 0.60);
        assert_eq!(label.provenance, Provenance::KeywordFallback);
        assert!(label.is_low_confidence());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_out_of_vocabulary_answer_falls_back() {
        let (mock, calls) = MockClassifier::answering("Startup Hub");
        let label = categorizer(mock).categorize("expansion", None, None).await;

        assert_eq!(label.category, Category::Other);
        assert_eq!(label.confidence, 0.0);
        assert_eq!(label.provenance, Provenance::KeywordFallback);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_classifier_falls_back() {
        let c = HybridCategorizer::new(CategorizerConfig::default(), AppClassifier::none());
        let label = c.categorize("Silicon Valley expansion", None, None).await;
        assert_eq!(label.provenance, Provenance::KeywordFallback);
        assert_eq!(label.category, Category::Geographic);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let (mut mock, calls) = MockClassifier::answering("Geographic");
        mock.delay = Some(Duration::from_secs(60));
        let label = categorizer(mock)
            .categorize("Silicon Valley expansion", None, None)
            .await;

        assert_eq!(label.provenance, Provenance::KeywordFallback);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_clamped_to_one() {
        let (mut mock, calls) = MockClassifier::answering("Geographic");
        mock.delay = Some(Duration::from_secs(60));
        let config = CategorizerConfig {
            max_retries: 10,
            ..CategorizerConfig::default()
        };
        let label = HybridCategorizer::new(config, AppClassifier::new(mock))
            .categorize("Silicon Valley expansion", None, None)
            .await;

        assert_eq!(label.provenance, Provenance::KeywordFallback);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_categorize_many_preserves_order() {
        let (mock, calls) = MockClassifier::answering("Geographic");
        let labels = categorizer(mock)
            .categorize_many(
                [
                    ("NVIDIA Corporation", None),
                    ("Silicon Valley expansion", Some("new campus")),
                    ("revenue", None),
                ],
                None,
            )
            .await;

        let categories: Vec<_> = labels.iter().map(|l| l.category).collect();
        assert_eq!(
            categories,
            vec![
                Category::Company,
                Category::Geographic,
                Category::FinancialMetric
            ]
        );
        assert_eq!(labels[1].provenance, Provenance::LlmEscalated);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
