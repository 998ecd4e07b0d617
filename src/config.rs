//! Resolver configuration
//!
//! Everything the pipeline needs from the environment is collected into a
//! [`ResolverConfig`] value up front and handed to construction, so the core
//! never reads process state while serving a request.

use serde::{Deserialize, Serialize};

use crate::catalog::Category;

/// Default Gemini model
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

/// Default Gemini REST endpoint (models collection)
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default number of correction attempts after a rejected first response
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Upper bound for `INTENT_MAX_ATTEMPTS`
pub const MAX_ATTEMPTS_LIMIT: usize = 10;

/// Upper bound for `GEMINI_TIMEOUT_SECS`
pub const MAX_TIMEOUT_SECS: u64 = 600;

/// A category-based hint that steers the model toward the right aisle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisambiguationHint {
    /// What the user might ask for, e.g. "chocolate cake"
    pub request: String,
    /// Catalog terms that usually satisfy that request
    pub look_for: Vec<String>,
    pub category: Category,
}

impl DisambiguationHint {
    pub fn new(request: &str, look_for: &[&str], category: Category) -> Self {
        Self {
            request: request.to_string(),
            look_for: look_for.iter().map(|s| s.to_string()).collect(),
            category,
        }
    }

    /// Hints shipped with the resolver
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(
                "chocolate cake",
                &["cake", "chocolate", "dessert"],
                Category::FoodAndFmcg,
            ),
            Self::new(
                "graphics card",
                &["GPU", "graphics card"],
                Category::ElectronicsAndElectricalEquipment,
            ),
        ]
    }
}

/// Configuration for the language-model collaborator and the correction loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Gemini API key; empty means the service is unconfigured
    #[serde(default, skip_serializing)]
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Correction attempts after the first response is rejected
    pub max_attempts: usize,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub hints: Vec<DisambiguationHint>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout_seconds: 60,
            temperature: Some(0.1),
            max_tokens: Some(8192),
            hints: DisambiguationHint::defaults(),
        }
    }
}

impl ResolverConfig {
    /// Create a configuration with an explicit key and model
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            ..Self::default()
        }
    }

    /// Read configuration from environment variables
    ///
    /// - `GEMINI_API_KEY` (absent leaves the service unconfigured)
    /// - `GEMINI_MODEL`, `GEMINI_BASE_URL`, `GEMINI_TIMEOUT_SECS`
    /// - `INTENT_MAX_ATTEMPTS`
    ///
    /// Numeric values are clamped to `1..=MAX_ATTEMPTS_LIMIT` and
    /// `1..=MAX_TIMEOUT_SECS`; unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            model: std::env::var("GEMINI_MODEL").unwrap_or(defaults.model),
            base_url: std::env::var("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            max_attempts: parse_clamped(
                std::env::var("INTENT_MAX_ATTEMPTS").ok(),
                defaults.max_attempts,
                1,
                MAX_ATTEMPTS_LIMIT,
            ),
            timeout_seconds: parse_clamped(
                std::env::var("GEMINI_TIMEOUT_SECS").ok(),
                defaults.timeout_seconds,
                1,
                MAX_TIMEOUT_SECS,
            ),
            ..defaults
        }
    }

    /// Whether language-model credentials are present
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Attempt budget with the floor of one applied
    pub fn correction_attempts(&self) -> usize {
        self.max_attempts.max(1)
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_hints(mut self, hints: Vec<DisambiguationHint>) -> Self {
        self.hints = hints;
        self
    }
}

/// Parse an optional numeric setting, clamping it into `min..=max`
fn parse_clamped<T>(raw: Option<String>, default: T, min: T, max: T) -> T
where
    T: std::str::FromStr + Ord,
{
    raw.and_then(|s| s.trim().parse::<T>().ok())
        .map(|value| value.clamp(min, max))
        .unwrap_or(default)
}
