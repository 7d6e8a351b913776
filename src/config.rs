//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. User config: `~/.config/icegraph/config.toml` (XDG) or platform config dir
//! 2. Project config: `.icegraph.toml`
//! 3. Environment variables: `ICEGRAPH_*`, nested keys split on `__`
//!
//! Every section has defaults, so an empty environment is a valid configuration
//! (keyword-only categorization, no LLM escalation).
//!
//! # Intended Usage
//!
//! **Global config** (`~/.config/icegraph/config.toml`):
//! ```toml
//! [llm]
//! provider = "openai"
//! api_base_url = "https://api.openai.com/v1/chat/completions"
//! model = "gpt-4o-mini"
//! timeout_seconds = 20
//! ```
//!
//! **Project config** (`.icegraph.toml`):
//! ```toml
//! [freshness]
//! half_life_days = 30.0
//! horizon_days = 730
//!
//! [categorizer]
//! threshold = 0.70
//! ```
//!
//! The API key is expected from the environment: `ICEGRAPH_LLM__API_KEY=sk-...`.

use std::ops::Deref;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub freshness: FreshnessConfig,
    pub categorizer: CategorizerConfig,
    pub llm: LlmConfig,
}

/// Decay curve parameters for the freshness scorer.
///
/// Bucket cutoffs are fixed and deliberately not configurable; see
/// [`FreshnessBucket`](crate::models::FreshnessBucket).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FreshnessConfig {
    /// Age in days at which the raw exponential halves.
    pub half_life_days: f64,
    /// Age in days at and beyond which the score is exactly 0.
    pub horizon_days: u32,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            half_life_days: 30.0,
            horizon_days: 730,
        }
    }
}

/// Hybrid categorizer policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CategorizerConfig {
    /// Keyword confidence at or above which the LLM is not consulted.
    pub threshold: f32,
    /// Confidence assigned to every accepted LLM answer.
    pub llm_confidence: f32,
    /// Upper bound on a single LLM classification attempt.
    pub llm_timeout_seconds: u64,
    /// Retries after a failed attempt. Values above 1 are clamped to 1.
    pub max_retries: u32,
    /// In-flight classifications for `categorize_many`.
    pub concurrency: usize,
}

impl Default for CategorizerConfig {
    fn default() -> Self {
        Self {
            threshold: 0.70,
            llm_confidence: 0.90,
            llm_timeout_seconds: 20,
            max_retries: 1,
            concurrency: 8,
        }
    }
}

impl CategorizerConfig {
    /// Retry budget actually honoured by the categorizer.
    pub fn effective_retries(&self) -> u32 {
        self.max_retries.min(1)
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: `"none"` disables escalation, `"openai"` (alias
    /// `"openai-compatible"`) targets any `/v1/chat/completions` endpoint.
    pub provider: String,
    /// Full chat-completions URL.
    pub api_base_url: String,
    /// Model identifier (e.g. "gpt-4o-mini").
    pub model: String,
    pub temperature: f32,
    /// HTTP client timeout.
    pub timeout_seconds: u64,
    /// Bearer token; `None` for keyless local servers.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "none".to_string(),
            api_base_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            timeout_seconds: 30,
            api_key: None,
        }
    }
}

impl Config {
    /// Load config with layered resolution (defaults → user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// The layered figment, exposed so callers can add their own providers.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            // Layer 1: User config (lowest priority)
            .merge(Toml::file(Self::user_config_path()))
            // Layer 2: Project config
            .merge(Toml::file(".icegraph.toml"))
            // Layer 3: Environment variables (highest priority)
            .merge(Env::prefixed("ICEGRAPH_").split("__"))
    }

    /// User config path: ~/.config/icegraph/config.toml (XDG) or platform config dir.
    fn user_config_path() -> std::path::PathBuf {
        // Prefer XDG config location (~/.config) on all platforms
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("icegraph").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        dirs::config_dir()
            .map(|p| p.join("icegraph").join("config.toml"))
            .unwrap_or_default()
    }
}
