//! Response Sanitizer
//!
//! Strips the wrapping a language model tends to put around JSON (code
//! fences, explanatory prose) and returns the best candidate substring.
//! Never fails: if nothing looks like an object, the trimmed text is
//! returned and parsing decides.

use std::sync::LazyLock;

use regex::Regex;

static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```json\s*").unwrap());
static ANY_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```\s*").unwrap());
// Greedy: first `{` through last `}`
static OUTER_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").unwrap());

/// Stateless sanitizer for raw model text
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseSanitizer;

impl ResponseSanitizer {
    /// Return the outermost `{...}` span of `raw` with fences removed
    pub fn sanitize(raw: &str) -> String {
        let cleaned = JSON_FENCE.replace_all(raw, "");
        let cleaned = ANY_FENCE.replace_all(&cleaned, "");
        let cleaned = cleaned.trim();

        match OUTER_OBJECT.find(cleaned) {
            Some(m) => m.as_str().to_string(),
            None => cleaned.to_string(),
        }
    }
}
