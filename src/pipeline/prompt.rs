//! Intent Resolver
//!
//! Builds the first prompt (request, catalog snapshot, hints, response
//! shape) and makes exactly one call to the language model.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use super::RawText;
use crate::catalog::CatalogItem;
use crate::config::DisambiguationHint;
use crate::llm::{GenerationError, TextGenerator};

/// The exact JSON shape the model must answer with
pub fn response_shape() -> Value {
    json!({
        "products": [{
            "name": "exact name from available items",
            "id": "exact id from available items",
            "price": "exactly as given as an input",
            "productUrl": "exactly as given as an input"
        }]
    })
}

/// Turns a request plus catalog snapshot into one model call
pub struct IntentResolver {
    generator: Arc<dyn TextGenerator>,
    hints: Vec<DisambiguationHint>,
}

impl IntentResolver {
    pub fn new(generator: Arc<dyn TextGenerator>, hints: Vec<DisambiguationHint>) -> Self {
        Self { generator, hints }
    }

    /// Ordered prompt parts for the first attempt
    pub fn build_prompt(&self, request: &str, snapshot: &[CatalogItem]) -> Vec<String> {
        let available: Vec<Value> = snapshot
            .iter()
            .map(|item| {
                json!({
                    "id": item.id,
                    "name": item.name,
                    "price": item.price,
                    "productUrl": item.product_url,
                })
            })
            .collect();

        let mut parts = vec![
            format!("User said: \"{}\"", request),
            format!(
                "Available items with their IDs: {}",
                Value::Array(available)
            ),
            "IMPORTANT: You must ONLY select products from the available items list above. \
             Match the user's intent to existing products and return their exact names and IDs."
                .to_string(),
        ];

        parts.extend(self.hints.iter().map(Self::render_hint));

        parts.push(
            "Strictly return this JSON format with ONLY products that exist in the available items:"
                .to_string(),
        );
        parts.push(response_shape().to_string());
        parts.push(
            "Do NOT create new product names and do NOT leave IDs empty. \
             Only use products that exist in the available items list."
                .to_string(),
        );

        parts
    }

    fn render_hint(hint: &DisambiguationHint) -> String {
        let look_for = hint
            .look_for
            .iter()
            .map(|term| format!("\"{}\"", term))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "If the user wants \"{}\", look for similar items like {} etc. in the {} category.",
            hint.request,
            look_for,
            hint.category.as_str().to_lowercase()
        )
    }

    /// Make the single first-attempt call
    pub async fn resolve(
        &self,
        request: &str,
        snapshot: &[CatalogItem],
    ) -> Result<RawText, GenerationError> {
        let parts = self.build_prompt(request, snapshot);
        debug!(
            model = self.generator.model_name(),
            parts = parts.len(),
            snapshot = snapshot.len(),
            "Requesting intent resolution"
        );
        let text = self.generator.generate(&parts).await?;
        debug!("Raw model response: {}", text);
        Ok(RawText::new(text))
    }
}
