//! Correction Loop
//!
//! Bounded retry that re-prompts the model with its own rejected output.
//! Modelled as an explicit state machine whose terminal fallback is a valid
//! (empty) result, so malformed output can never escape as an error.
//!
//! ```text
//! Attempting(1) ─ok→ Succeeded
//!      │ bad
//!      ▼
//! Attempting(n) ─ok→ Succeeded
//!      │ bad, n == max
//!      ▼
//! ExhaustedFallback (empty list + diagnostic)
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::prompt::response_shape;
use super::schema::CandidateList;
use super::{MalformedOutput, RawText};
use crate::llm::{GenerationError, TextGenerator};

/// Diagnostic message attached to an exhausted fallback
pub const EXHAUSTED_MESSAGE: &str = "Failed to get correct format after retries";

/// What the caller gets told when every correction attempt failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionDiagnostic {
    pub error: String,
    pub attempts: usize,
    /// Prior-response context used for the final attempt
    pub incorrect_response: String,
    /// Why the final attempt was rejected
    pub last_error: String,
    /// Raw text of the final attempt
    pub raw_response: String,
}

/// Retry state machine
#[derive(Debug, Clone, PartialEq)]
pub enum CorrectionState {
    Attempting {
        attempt: usize,
        prior_response: String,
    },
    Succeeded {
        candidates: CandidateList,
        attempts: usize,
    },
    ExhaustedFallback(CorrectionDiagnostic),
}

/// Settled result of the loop
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionOutcome {
    pub candidates: CandidateList,
    pub attempts: usize,
    pub diagnostic: Option<CorrectionDiagnostic>,
}

/// Re-prompts the model until its output has the required shape
pub struct CorrectionLoop {
    generator: Arc<dyn TextGenerator>,
    max_attempts: usize,
}

impl CorrectionLoop {
    pub fn new(generator: Arc<dyn TextGenerator>, max_attempts: usize) -> Self {
        Self {
            generator,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Prompt parts for one correction attempt
    pub fn correction_prompt(request: &str, prior_response: &str) -> Vec<String> {
        vec![
            format!("Original user request: \"{}\"", request),
            format!("You previously responded with: \"{}\"", prior_response),
            "This response was not in valid JSON format. Please correct it and respond with ONLY this exact JSON structure:"
                .to_string(),
            response_shape().to_string(),
            "IMPORTANT: Only use products that actually exist in the database. Do NOT create new product names or leave IDs empty."
                .to_string(),
            "Make sure to return ONLY valid JSON, no additional text or explanation.".to_string(),
        ]
    }

    /// Drive the state machine to a terminal state
    ///
    /// `rejected` is the first-attempt reply that failed to parse or validate.
    /// Only a transport failure of the generator is returned as an error.
    pub async fn run(
        &self,
        request: &str,
        rejected: &RawText,
    ) -> Result<CorrectionOutcome, GenerationError> {
        let mut state = CorrectionState::Attempting {
            attempt: 1,
            prior_response: rejected.as_str().to_string(),
        };

        loop {
            state = match state {
                CorrectionState::Attempting {
                    attempt,
                    prior_response,
                } => self.step(request, attempt, prior_response).await?,
                CorrectionState::Succeeded {
                    candidates,
                    attempts,
                } => {
                    return Ok(CorrectionOutcome {
                        candidates,
                        attempts,
                        diagnostic: None,
                    })
                }
                CorrectionState::ExhaustedFallback(diagnostic) => {
                    warn!(
                        attempts = diagnostic.attempts,
                        "All retry attempts failed, returning empty candidate list"
                    );
                    return Ok(CorrectionOutcome {
                        candidates: CandidateList::empty(),
                        attempts: diagnostic.attempts,
                        diagnostic: Some(diagnostic),
                    });
                }
            };
        }
    }

    async fn step(
        &self,
        request: &str,
        attempt: usize,
        prior_response: String,
    ) -> Result<CorrectionState, GenerationError> {
        info!(attempt, max = self.max_attempts, "Retry attempt for correct JSON format");

        let parts = Self::correction_prompt(request, &prior_response);
        let raw = RawText::new(self.generator.generate(&parts).await?);

        Ok(match raw.interpret() {
            Ok(candidates) => {
                info!(attempt, "Got correct format on retry attempt");
                CorrectionState::Succeeded {
                    candidates,
                    attempts: attempt,
                }
            }
            Err(failure) => {
                debug!("Rejected retry response: {}", raw.as_str());
                warn!(attempt, error = %failure, "Retry attempt failed");
                self.transition(attempt, prior_response, &failure, &raw)
            }
        })
    }

    /// Next state after a rejected attempt
    pub fn transition(
        &self,
        attempt: usize,
        prior_response: String,
        failure: &MalformedOutput,
        raw: &RawText,
    ) -> CorrectionState {
        if attempt >= self.max_attempts {
            return CorrectionState::ExhaustedFallback(CorrectionDiagnostic {
                error: EXHAUSTED_MESSAGE.to_string(),
                attempts: attempt,
                incorrect_response: prior_response,
                last_error: failure.to_string(),
                raw_response: raw.as_str().to_string(),
            });
        }

        CorrectionState::Attempting {
            attempt: attempt + 1,
            prior_response: format!("Previous attempt failed with error: {}", failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::schema::ShapeError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct Scripted {
        replies: Mutex<VecDeque<Result<String, GenerationError>>>,
        prompts: Mutex<Vec<Vec<String>>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String, GenerationError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, parts: &[String]) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(parts.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("still no json".to_string()))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    const GOOD: &str = r#"{"products": [{"name": "Dark Chocolate Cake", "id": "p1"}]}"#;

    #[tokio::test]
    async fn test_succeeds_on_second_attempt() {
        let generator = Scripted::new(vec![Ok("nope".into()), Ok(format!("```json\n{}\n```", GOOD))]);
        let correction = CorrectionLoop::new(generator.clone(), 3);

        let outcome = correction
            .run("chocolate cake", &RawText::new("prose only"))
            .await
            .unwrap();

        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.candidates.len(), 1);
        assert!(outcome.diagnostic.is_none());
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_exhausts_after_max_attempts() {
        let generator = Scripted::new(vec![]);
        let correction = CorrectionLoop::new(generator.clone(), 3);

        let outcome = correction
            .run("chocolate cake", &RawText::new("prose only"))
            .await
            .unwrap();

        assert_eq!(generator.calls(), 3);
        assert!(outcome.candidates.is_empty());
        let diagnostic = outcome.diagnostic.unwrap();
        assert_eq!(diagnostic.error, EXHAUSTED_MESSAGE);
        assert_eq!(diagnostic.attempts, 3);
        assert_eq!(diagnostic.raw_response, "still no json");
    }

    #[tokio::test]
    async fn test_prior_response_carried_forward() {
        let generator = Scripted::new(vec![
            Ok(r#"{"products": [{"name": "", "id": "p1"}]}"#.into()),
            Ok(GOOD.into()),
        ]);
        let correction = CorrectionLoop::new(generator.clone(), 3);

        correction
            .run("chocolate cake", &RawText::new("first bad reply"))
            .await
            .unwrap();

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts[0][0], "Original user request: \"chocolate cake\"");
        assert!(prompts[0][1].contains("first bad reply"));
        assert!(prompts[1][1].contains("Previous attempt failed with error: shape rejected"));
        assert!(prompts[1][1].contains("\"name\" is empty"));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let generator = Scripted::new(vec![Err(GenerationError::Timeout(30))]);
        let correction = CorrectionLoop::new(generator, 3);

        let result = correction.run("cake", &RawText::new("bad")).await;
        assert!(matches!(result, Err(GenerationError::Timeout(30))));
    }

    #[test]
    fn test_transition_table() {
        let generator = Scripted::new(vec![]);
        let correction = CorrectionLoop::new(generator, 2);
        let failure = MalformedOutput::Shape(ShapeError::MissingList);
        let raw = RawText::new("{}");

        match correction.transition(1, "ctx".into(), &failure, &raw) {
            CorrectionState::Attempting {
                attempt,
                prior_response,
            } => {
                assert_eq!(attempt, 2);
                assert!(prior_response.starts_with("Previous attempt failed with error:"));
            }
            other => panic!("expected Attempting, got {:?}", other),
        }

        match correction.transition(2, "ctx".into(), &failure, &raw) {
            CorrectionState::ExhaustedFallback(diagnostic) => {
                assert_eq!(diagnostic.attempts, 2);
                assert_eq!(diagnostic.incorrect_response, "ctx");
            }
            other => panic!("expected ExhaustedFallback, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_budget_still_attempts_once() {
        let generator = Scripted::new(vec![]);
        assert_eq!(CorrectionLoop::new(generator, 0).max_attempts(), 1);
    }
}
