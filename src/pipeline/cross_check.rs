//! Catalog Cross-Checker
//!
//! Trust boundary between model output and the caller. Each candidate is
//! looked up by identity and name among available catalog items; survivors
//! are rebuilt from the catalog row, so nothing the model echoed (price,
//! URL) is ever forwarded.

use std::sync::Arc;

use futures::{stream, StreamExt, TryStreamExt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::schema::{CandidateList, ProposedMatch};
use crate::catalog::{CatalogError, CatalogGateway, CatalogItem};

/// Catalog lookups in flight at once for a single request
pub const MAX_CONCURRENT_LOOKUPS: usize = 4;

/// A candidate independently re-derived from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedItem {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    #[serde(rename = "productUrl")]
    pub product_url: String,
}

impl From<CatalogItem> for ConfirmedItem {
    fn from(item: CatalogItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            price: item.price,
            product_url: item.product_url,
        }
    }
}

pub struct CatalogCrossChecker {
    catalog: Arc<dyn CatalogGateway>,
}

impl CatalogCrossChecker {
    pub fn new(catalog: Arc<dyn CatalogGateway>) -> Self {
        Self { catalog }
    }

    /// Keep only candidates that exist as available catalog items
    ///
    /// At most [`MAX_CONCURRENT_LOOKUPS`] lookups run at once; output order
    /// follows candidate order.
    /// A miss is dropped, a store failure aborts the whole check.
    pub async fn confirm(
        &self,
        candidates: &CandidateList,
    ) -> Result<Vec<ConfirmedItem>, CatalogError> {
        let found: Vec<Option<ConfirmedItem>> = stream::iter(candidates)
            .map(|candidate| self.lookup(candidate))
            .buffered(MAX_CONCURRENT_LOOKUPS)
            .try_collect()
            .await?;
        let confirmed: Vec<ConfirmedItem> = found.into_iter().flatten().collect();

        info!(
            requested = candidates.len(),
            confirmed = confirmed.len(),
            "Cross-checked candidates against catalog"
        );
        Ok(confirmed)
    }

    async fn lookup(
        &self,
        candidate: &ProposedMatch,
    ) -> Result<Option<ConfirmedItem>, CatalogError> {
        let found = self
            .catalog
            .find_confirmed(&candidate.id, &candidate.name)
            .await?;

        if found.is_none() {
            info!(
                id = %candidate.id,
                name = %candidate.name,
                "Product not found in catalog"
            );
        }
        Ok(found.map(ConfirmedItem::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::pipeline::schema::SchemaValidator;
    use serde_json::json;

    fn catalog() -> Arc<dyn CatalogGateway> {
        Arc::new(InMemoryCatalog::new(
            vec![
                CatalogItem {
                    id: "p1".into(),
                    name: "Dark Chocolate Cake".into(),
                    price: Decimal::new(1250, 2),
                    product_url: "https://shop.example/p1".into(),
                    is_available: true,
                    category: None,
                },
                CatalogItem {
                    id: "p2".into(),
                    name: "Carrot Cake".into(),
                    price: Decimal::new(900, 2),
                    product_url: String::new(),
                    is_available: true,
                    category: None,
                },
            ],
            vec![],
        ))
    }

    fn candidates(value: serde_json::Value) -> CandidateList {
        SchemaValidator::validate(&value).unwrap()
    }

    #[tokio::test]
    async fn test_drops_hallucinated_ids() {
        let checker = CatalogCrossChecker::new(catalog());
        let list = candidates(json!({"products": [
            {"name": "Dark Chocolate Cake", "id": "p1"},
            {"name": "Unicorn Cake", "id": "p99"}
        ]}));

        let confirmed = checker.confirm(&list).await.unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].id, "p1");
    }

    #[tokio::test]
    async fn test_discards_echoed_fields() {
        let checker = CatalogCrossChecker::new(catalog());
        let list = candidates(json!({"products": [
            {"name": "Dark Chocolate Cake", "id": "p1", "price": "0.01", "productUrl": "https://evil.example"}
        ]}));

        let confirmed = checker.confirm(&list).await.unwrap();
        assert_eq!(confirmed[0].price, Decimal::new(1250, 2));
        assert_eq!(confirmed[0].product_url, "https://shop.example/p1");
    }

    #[tokio::test]
    async fn test_preserves_candidate_order() {
        let checker = CatalogCrossChecker::new(catalog());
        let list = candidates(json!({"products": [
            {"name": "Carrot Cake", "id": "p2"},
            {"name": "Dark Chocolate Cake", "id": "p1"}
        ]}));

        let ids: Vec<String> = checker
            .confirm(&list)
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.id)
            .collect();
        assert_eq!(ids, vec!["p2", "p1"]);
    }

    #[tokio::test]
    async fn test_stale_name_is_a_miss() {
        let checker = CatalogCrossChecker::new(catalog());
        let list = candidates(json!({"products": [{"name": "Chocolate Cake", "id": "p1"}]}));
        assert!(checker.confirm(&list).await.unwrap().is_empty());
    }
}
