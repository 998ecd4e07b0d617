//! Intent REST API
//!
//! Thin HTTP adapter over [`IntentPipeline`]. The core has no transport
//! concept; this module owns the mapping from failure kinds to status codes.
//!
//! ## Endpoints
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/api/gemini/list` | POST | Resolve `{"text": "..."}` into catalog items |
//! | `/api/health` | GET | Liveness and configuration status |

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::error;

use crate::error::{FailureKind, ResolveError};
use crate::pipeline::IntentPipeline;

/// Shared state for intent routes
#[derive(Clone)]
pub struct IntentState {
    pub pipeline: Arc<IntentPipeline>,
}

/// Build the router with all intent routes under `/api`
pub fn create_intent_router(pipeline: Arc<IntentPipeline>) -> Router {
    Router::new()
        .route("/api/gemini/list", post(list_items))
        .route("/api/health", get(health))
        .with_state(IntentState { pipeline })
}

fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::InvalidInput => StatusCode::BAD_REQUEST,
        FailureKind::ServiceUnconfigured | FailureKind::UpstreamFailure => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn failure_response(err: &ResolveError) -> (StatusCode, Json<Value>) {
    let failure = err.to_failure();
    let message = match failure.kind {
        FailureKind::InvalidInput => "Text input is required and must be a string",
        FailureKind::ServiceUnconfigured => "Gemini API key is not configured",
        FailureKind::UpstreamFailure => "Failed to get response from Gemini AI",
    };
    (
        status_for(failure.kind),
        Json(json!({
            "error": message,
            "kind": failure.kind,
            "details": failure.detail,
        })),
    )
}

async fn list_items(
    State(state): State<IntentState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let text = body
        .get("text")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            failure_response(&ResolveError::invalid_input(
                "\"text\" is missing or not a string",
            ))
        })?;

    match state.pipeline.resolve_intent(text).await {
        Ok(result) => serde_json::to_value(&result).map(Json).map_err(|e| {
            error!("Failed to serialize resolution result: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to serialize result"})),
            )
        }),
        Err(e) => {
            if e.kind() != FailureKind::InvalidInput {
                error!(kind = %e.kind(), "Intent resolution failed: {}", e);
            }
            Err(failure_response(&e))
        }
    }
}

async fn health(State(state): State<IntentState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "llm_configured": state.pipeline.is_configured(),
    }))
}
