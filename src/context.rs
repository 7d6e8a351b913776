//! Application context providing dependency injection root.

use std::sync::Arc;

use crate::config::{CategorizerConfig, Config, FreshnessConfig};
use crate::di::{Context as ContextDerive, FromRef};
use crate::error::AppError;
use crate::llm::{providers, CategoryClassifier};

/// Shared handle to the LLM classifier, if one is configured.
///
/// `None` means categorization never escalates and ambiguous names are reported as
/// keyword fallbacks.
#[derive(Clone, Default)]
pub struct AppClassifier(Option<Arc<dyn CategoryClassifier>>);

impl AppClassifier {
    pub fn new(classifier: impl CategoryClassifier + 'static) -> Self {
        Self(Some(Arc::new(classifier)))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn get(&self) -> Option<&dyn CategoryClassifier> {
        self.0.as_deref()
    }

    pub fn is_configured(&self) -> bool {
        self.0.is_some()
    }
}

impl std::fmt::Debug for AppClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AppClassifier")
            .field(&if self.is_configured() { "configured" } else { "none" })
            .finish()
    }
}

/// Root application context for dependency injection.
///
/// Built once from [`Config`]. `#[derive(Context)]` generates a `FromRef`
/// implementation for each field, so services resolve their dependencies at
/// compile time.
#[derive(ContextDerive, Clone)]
pub struct Context {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Decay curve, shared by the scorer and everything built on it.
    pub freshness: Arc<FreshnessConfig>,
    /// Categorizer policy.
    pub categorizer: Arc<CategorizerConfig>,
    /// LLM classifier handle.
    pub classifier: AppClassifier,
}

impl Context {
    /// Creates a new context with the given dependencies.
    pub fn new(config: Config, classifier: AppClassifier) -> Self {
        Self {
            freshness: Arc::new(config.freshness.clone()),
            categorizer: Arc::new(config.categorizer.clone()),
            config: Arc::new(config),
            classifier,
        }
    }

    /// Creates a context, building the LLM provider named in `config.llm`.
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let classifier = match providers::build(&config.llm)? {
            Some(provider) => {
                tracing::debug!(
                    provider = %config.llm.provider,
                    model = %config.llm.model,
                    "LLM classifier configured"
                );
                AppClassifier::new(provider)
            }
            None => AppClassifier::none(),
        };
        Ok(Self::new(config, classifier))
    }

    /// Resolves any type extractable from the context.
    pub fn resolve<T: FromRef<Self>>(&self) -> T {
        T::from_ref(self)
    }
}
