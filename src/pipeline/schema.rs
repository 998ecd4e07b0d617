//! Schema Validator
//!
//! Shape check for parsed model output. Required shape:
//!
//! ```json
//! { "products": [ { "name": "<non-empty>", "id": "<non-empty>" }, ... ] }
//! ```
//!
//! Extra fields are tolerated and carried as echoes so they can be
//! discarded later. No catalog lookups happen here.

use serde_json::Value;
use thiserror::Error;

/// Field holding the candidate list in the model's reply
pub const CANDIDATE_LIST_FIELD: &str = "products";

/// Why a parsed value was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("top-level value is {0}, expected an object")]
    NotAnObject(&'static str),

    #[error("missing \"products\" list")]
    MissingList,

    #[error("\"products\" is {0}, expected a list")]
    ListNotArray(&'static str),

    #[error("entry {index} is {kind}, expected an object")]
    EntryNotObject { index: usize, kind: &'static str },

    #[error("entry {index} field \"{field}\" is missing or not a string")]
    FieldNotString { index: usize, field: &'static str },

    #[error("entry {index} field \"{field}\" is empty")]
    FieldEmpty { index: usize, field: &'static str },
}

/// Untrusted item proposal produced by the model
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedMatch {
    pub name: String,
    pub id: String,
    /// Price as echoed by the model; never forwarded
    pub echoed_price: Option<Value>,
    /// URL as echoed by the model; never forwarded
    pub echoed_url: Option<String>,
}

/// Shape-valid, still untrusted, candidate list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateList(Vec<ProposedMatch>);

impl CandidateList {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProposedMatch> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[ProposedMatch] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a CandidateList {
    type Item = &'a ProposedMatch;
    type IntoIter = std::slice::Iter<'a, ProposedMatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Stateless shape validator
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    /// Validate shape and, on success, produce the typed candidate list
    pub fn validate(value: &Value) -> Result<CandidateList, ShapeError> {
        let object = value
            .as_object()
            .ok_or_else(|| ShapeError::NotAnObject(kind_of(value)))?;

        let list = object
            .get(CANDIDATE_LIST_FIELD)
            .ok_or(ShapeError::MissingList)?;
        let entries = list
            .as_array()
            .ok_or_else(|| ShapeError::ListNotArray(kind_of(list)))?;

        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| Self::validate_entry(index, entry))
            .collect::<Result<Vec<_>, _>>()
            .map(CandidateList)
    }

    /// Boolean verdict only
    pub fn is_valid(value: &Value) -> bool {
        Self::validate(value).is_ok()
    }

    fn validate_entry(index: usize, entry: &Value) -> Result<ProposedMatch, ShapeError> {
        let fields = entry.as_object().ok_or_else(|| ShapeError::EntryNotObject {
            index,
            kind: kind_of(entry),
        })?;

        let name = required_text(fields.get("name"), index, "name")?;
        let id = required_text(fields.get("id"), index, "id")?;

        Ok(ProposedMatch {
            name: name.to_string(),
            id: id.to_string(),
            echoed_price: fields.get("price").cloned(),
            echoed_url: fields
                .get("productUrl")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

fn required_text<'a>(
    value: Option<&'a Value>,
    index: usize,
    field: &'static str,
) -> Result<&'a str, ShapeError> {
    let text = value
        .and_then(Value::as_str)
        .ok_or(ShapeError::FieldNotString { index, field })?;
    if text.trim().is_empty() {
        return Err(ShapeError::FieldEmpty { index, field });
    }
    Ok(text)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
