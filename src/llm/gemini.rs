//! Google Gemini API Client Implementation
//!
//! Sends prompt parts to the `generateContent` endpoint and hands back the
//! first candidate's text untouched.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

use super::{GenerationError, TextGenerator};
use crate::config::ResolverConfig;

/// Finish reason of a candidate that completed normally
const FINISH_STOP: &str = "STOP";

/// Gemini API client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    endpoint: Url,
    timeout_seconds: u64,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    client: Client,
}

/// Gemini API request format
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// Gemini API response format
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u32>,
    #[serde(default)]
    candidates_token_count: Option<u32>,
    #[serde(default)]
    total_token_count: Option<u32>,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: &ResolverConfig) -> Result<Self, GenerationError> {
        if !config.is_configured() {
            return Err(GenerationError::MissingCredentials);
        }

        let endpoint = Self::endpoint_for(&config.base_url, &config.model)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint,
            timeout_seconds: config.timeout_seconds,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    fn endpoint_for(base_url: &str, model: &str) -> Result<Url, GenerationError> {
        let raw = format!(
            "{}/{}:generateContent",
            base_url.trim_end_matches('/'),
            model
        );
        Url::parse(&raw)
            .map_err(|e| GenerationError::Configuration(format!("bad Gemini URL '{}': {}", raw, e)))
    }

    fn build_request(&self, parts: &[String]) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: parts
                    .iter()
                    .map(|text| GeminiPart { text: text.clone() })
                    .collect(),
            }],
            generation_config: Some(GeminiGenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_tokens,
            }),
        }
    }

    /// Pull the first candidate's text out of a response body
    fn extract_text(response_text: &str) -> Result<String, GenerationError> {
        let gemini_response: GeminiResponse =
            serde_json::from_str(response_text).map_err(|e| {
                error!("Failed to parse Gemini response: {}", e);
                GenerationError::InvalidResponse(e.to_string())
            })?;

        if let Some(usage) = &gemini_response.usage_metadata {
            info!(
                prompt_tokens = ?usage.prompt_token_count,
                response_tokens = ?usage.candidates_token_count,
                total_tokens = ?usage.total_token_count,
                "Gemini API usage"
            );
        }

        let candidate = gemini_response.candidates.into_iter().next().ok_or_else(|| {
            GenerationError::InvalidResponse("No candidates in response".to_string())
        })?;

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        // An empty reply that finished normally is bad content, not a failed call
        match candidate.finish_reason.as_deref() {
            Some(reason) if text.is_empty() && reason != FINISH_STOP => {
                Err(GenerationError::InvalidResponse(format!(
                    "No text in candidate (finish reason: {})",
                    reason
                )))
            }
            _ => Ok(text),
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, parts: &[String]) -> Result<String, GenerationError> {
        let request_body = self.build_request(parts);

        debug!(
            model = %self.model,
            parts = parts.len(),
            "Sending request to Gemini API: {}",
            self.endpoint
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(self.timeout_seconds)
                } else {
                    GenerationError::Http(e)
                }
            })?;

        let status = response.status();
        let response_text = response.text().await?;

        debug!("Gemini API response status: {}", status);

        if !status.is_success() {
            error!("Gemini API error: {} - {}", status, response_text);
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body: response_text,
            });
        }

        Self::extract_text(&response_text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
