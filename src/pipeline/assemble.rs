//! Result Assembler
//!
//! Pure composition of the pipeline's final answer. No lookups happen here.

use serde::{Deserialize, Serialize};

use super::correction::CorrectionDiagnostic;
use super::cross_check::ConfirmedItem;
use crate::catalog::LocationRecord;

/// Final answer for one resolution request
///
/// Invariants: `found_count == confirmed_items.len() <= requested_count`
/// and `locations.len() <= confirmed_items.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    #[serde(rename = "products")]
    pub confirmed_items: Vec<ConfirmedItem>,
    #[serde(rename = "ProductAddresses")]
    pub locations: Vec<LocationRecord>,
    #[serde(rename = "totalRequestedProducts")]
    pub requested_count: usize,
    #[serde(rename = "totalFoundProducts")]
    pub found_count: usize,
    /// Present only when the correction loop gave up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<CorrectionDiagnostic>,
}

impl ResolutionResult {
    /// True when nothing in the catalog matched (a success, not a failure)
    pub fn is_empty(&self) -> bool {
        self.found_count == 0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResultAssembler;

impl ResultAssembler {
    /// `requested_count` is the size of the settled candidate list
    pub fn assemble(
        confirmed_items: Vec<ConfirmedItem>,
        locations: Vec<LocationRecord>,
        requested_count: usize,
        diagnostic: Option<CorrectionDiagnostic>,
    ) -> ResolutionResult {
        let found_count = confirmed_items.len();
        ResolutionResult {
            confirmed_items,
            locations,
            requested_count,
            found_count,
            diagnostic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_counts_and_wire_names() {
        let item = ConfirmedItem {
            id: "p1".into(),
            name: "Dark Chocolate Cake".into(),
            price: Decimal::new(1250, 2),
            product_url: String::new(),
        };
        let result = ResultAssembler::assemble(vec![item], vec![], 3, None);
        assert_eq!(result.found_count, 1);
        assert_eq!(result.requested_count, 3);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["totalFoundProducts"], 1);
        assert_eq!(json["totalRequestedProducts"], 3);
        assert_eq!(json["products"][0]["id"], "p1");
        assert!(json["ProductAddresses"].as_array().unwrap().is_empty());
        assert!(json.get("diagnostic").is_none());
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let result = ResultAssembler::assemble(vec![], vec![], 0, None);
        assert!(result.is_empty());
    }
}
