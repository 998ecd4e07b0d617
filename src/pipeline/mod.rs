//! Intent Resolution Pipeline
//!
//! Main entry point: [`IntentPipeline::resolve_intent`].
//!
//! Stages run strictly in order because each consumes the previous one's
//! output:
//!
//! 1. Snapshot available items ([`CatalogGateway::list_available`])
//! 2. First model call ([`IntentResolver`])
//! 3. Sanitize → parse → validate ([`RawText::interpret`])
//! 4. On rejection only, the bounded [`CorrectionLoop`]
//! 5. Cross-check against the catalog ([`CatalogCrossChecker`])
//! 6. Fetch locations ([`LocationResolver`])
//! 7. Compose the answer ([`ResultAssembler`])

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::catalog::CatalogGateway;
use crate::config::ResolverConfig;
use crate::error::ResolveError;
use crate::llm::{GeminiClient, GenerationError, TextGenerator};

pub mod assemble;
pub mod correction;
pub mod cross_check;
pub mod location;
pub mod prompt;
pub mod sanitizer;
pub mod schema;

pub use assemble::{ResolutionResult, ResultAssembler};
pub use correction::{CorrectionDiagnostic, CorrectionLoop, CorrectionOutcome, CorrectionState};
pub use cross_check::{CatalogCrossChecker, ConfirmedItem, MAX_CONCURRENT_LOOKUPS};
pub use location::LocationResolver;
pub use prompt::IntentResolver;
pub use sanitizer::ResponseSanitizer;
pub use schema::{CandidateList, ProposedMatch, SchemaValidator, ShapeError};

/// Untrusted text straight from the language model
///
/// The only way to get data out of it is [`RawText::interpret`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawText(String);

impl RawText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Sanitize, parse and shape-check
    pub fn interpret(&self) -> Result<CandidateList, MalformedOutput> {
        let cleaned = ResponseSanitizer::sanitize(&self.0);
        debug!("Cleaned response: {}", cleaned);
        let value: Value = serde_json::from_str(&cleaned)?;
        Ok(SchemaValidator::validate(&value)?)
    }
}

/// Model output that could not be turned into a candidate list
#[derive(Debug, Error)]
pub enum MalformedOutput {
    #[error("{0}")]
    Parse(#[from] serde_json::Error),

    #[error("shape rejected: {0}")]
    Shape(#[from] ShapeError),
}

/// Model-facing stages, absent when no credentials are configured
struct ModelStages {
    resolver: IntentResolver,
    correction: CorrectionLoop,
    model: String,
}

/// One pipeline instance serves any number of concurrent requests
pub struct IntentPipeline {
    model_stages: Option<ModelStages>,
    cross_checker: CatalogCrossChecker,
    locator: LocationResolver,
    catalog: Arc<dyn CatalogGateway>,
}

impl IntentPipeline {
    /// Create a pipeline with an explicit generator
    pub fn new(
        config: &ResolverConfig,
        catalog: Arc<dyn CatalogGateway>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        let model_stages = ModelStages {
            model: generator.model_name().to_string(),
            resolver: IntentResolver::new(generator.clone(), config.hints.clone()),
            correction: CorrectionLoop::new(generator, config.correction_attempts()),
        };
        Self {
            model_stages: Some(model_stages),
            cross_checker: CatalogCrossChecker::new(catalog.clone()),
            locator: LocationResolver::new(catalog.clone()),
            catalog,
        }
    }

    /// Create a pipeline that rejects every request as unconfigured
    pub fn unconfigured(catalog: Arc<dyn CatalogGateway>) -> Self {
        Self {
            model_stages: None,
            cross_checker: CatalogCrossChecker::new(catalog.clone()),
            locator: LocationResolver::new(catalog.clone()),
            catalog,
        }
    }

    /// Create a Gemini-backed pipeline from configuration
    ///
    /// Missing credentials do not fail construction; requests are then
    /// rejected with `service_unconfigured`.
    pub fn from_config(
        config: &ResolverConfig,
        catalog: Arc<dyn CatalogGateway>,
    ) -> Result<Self, GenerationError> {
        match GeminiClient::new(config) {
            Ok(client) => Ok(Self::new(config, catalog, Arc::new(client))),
            Err(GenerationError::MissingCredentials) => {
                warn!("GEMINI_API_KEY is not set; intent resolution is disabled");
                Ok(Self::unconfigured(catalog))
            }
            Err(e) => Err(e),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.model_stages.is_some()
    }

    /// Resolve free text into catalog-verified, located items
    ///
    /// `Ok` with `found_count == 0` means nothing matched; `Err` means the
    /// pipeline itself could not run.
    pub async fn resolve_intent(&self, request_text: &str) -> Result<ResolutionResult, ResolveError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("resolve_intent", %request_id);
        self.run(request_text).instrument(span).await
    }

    async fn run(&self, request_text: &str) -> Result<ResolutionResult, ResolveError> {
        if request_text.trim().is_empty() {
            return Err(ResolveError::invalid_input(
                "Text input is required and must be a non-empty string",
            ));
        }

        let stages = self.model_stages.as_ref().ok_or_else(|| {
            ResolveError::ServiceUnconfigured(
                "Gemini API key is not configured. Please set GEMINI_API_KEY.".to_string(),
            )
        })?;

        info!(model = %stages.model, "Resolving shopping intent");

        let snapshot = self.catalog.list_available().await?;
        let raw = stages.resolver.resolve(request_text, &snapshot).await?;

        let (candidates, diagnostic) = match raw.interpret() {
            Ok(candidates) => (candidates, None),
            Err(failure) => {
                warn!(error = %failure, "First response rejected, entering correction loop");
                let outcome = stages.correction.run(request_text, &raw).await?;
                (outcome.candidates, outcome.diagnostic)
            }
        };

        let confirmed = self.cross_checker.confirm(&candidates).await?;
        let locations = self.locator.locate(&confirmed).await?;

        let result =
            ResultAssembler::assemble(confirmed, locations, candidates.len(), diagnostic);

        info!(
            requested = result.requested_count,
            found = result.found_count,
            located = result.locations.len(),
            "Intent resolved"
        );
        Ok(result)
    }
}
