//! Generative Text Client
//!
//! Unified interface for the language-model service. The pipeline only ever
//! sees raw text from here; turning it into data is the pipeline's job.

use async_trait::async_trait;
use thiserror::Error;

pub mod gemini;

pub use gemini::GeminiClient;

/// Transport-level failures of the generative service
///
/// These are distinct from the model producing bad content, which is not an
/// error at this layer.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Language model timed out after {0} seconds")]
    Timeout(u64),

    #[error("Invalid response envelope: {0}")]
    InvalidResponse(String),

    #[error("Missing or empty API key")]
    MissingCredentials,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Language-model service consumed by the pipeline
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send an ordered sequence of prompt parts, return the raw text reply
    async fn generate(&self, parts: &[String]) -> Result<String, GenerationError>;

    /// Get the model name for logging
    fn model_name(&self) -> &str;
}
