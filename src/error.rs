//! Resolution errors
//!
//! Only three failure kinds ever leave the pipeline. Malformed model output
//! and catalog misses are recovered internally and show up as a smaller (or
//! empty) result, never as an error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::llm::GenerationError;

/// Failure category reported to the routing layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidInput,
    ServiceUnconfigured,
    UpstreamFailure,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::InvalidInput => "invalid_input",
            FailureKind::ServiceUnconfigured => "service_unconfigured",
            FailureKind::UpstreamFailure => "upstream_failure",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by [`crate::IntentPipeline::resolve_intent`]
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Language model service is not configured: {0}")]
    ServiceUnconfigured(String),

    #[error("Language model request failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Catalog request failed: {0}")]
    Catalog(#[from] CatalogError),
}

impl ResolveError {
    pub fn invalid_input(details: impl Into<String>) -> Self {
        Self::InvalidInput(details.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            ResolveError::InvalidInput(_) => FailureKind::InvalidInput,
            ResolveError::ServiceUnconfigured(_) => FailureKind::ServiceUnconfigured,
            ResolveError::Generation(GenerationError::MissingCredentials) => {
                FailureKind::ServiceUnconfigured
            }
            ResolveError::Generation(_) | ResolveError::Catalog(_) => FailureKind::UpstreamFailure,
        }
    }

    /// Human-readable detail without the kind prefix
    pub fn detail(&self) -> String {
        match self {
            ResolveError::InvalidInput(details) | ResolveError::ServiceUnconfigured(details) => {
                details.clone()
            }
            ResolveError::Generation(e) => e.to_string(),
            ResolveError::Catalog(e) => e.to_string(),
        }
    }

    pub fn to_failure(&self) -> Failure {
        Failure {
            kind: self.kind(),
            detail: self.detail(),
        }
    }
}

/// Serializable failure carried back to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub detail: String,
}
