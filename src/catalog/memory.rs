//! In-memory catalog
//!
//! Snapshot-backed [`CatalogGateway`] used by tests and by the server when
//! it is pointed at a fixture file instead of a database.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use super::{CatalogError, CatalogGateway, CatalogItem, LocationRecord};

/// Catalog held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    items: Vec<CatalogItem>,
    locations: HashMap<String, LocationRecord>,
}

/// On-disk fixture layout
#[derive(Debug, Deserialize)]
struct CatalogFixture {
    #[serde(default)]
    items: Vec<CatalogItem>,
    #[serde(default)]
    locations: Vec<LocationRecord>,
}

impl InMemoryCatalog {
    pub fn new(items: Vec<CatalogItem>, locations: Vec<LocationRecord>) -> Self {
        // First record per item wins
        let mut by_item = HashMap::new();
        for loc in locations {
            by_item.entry(loc.item_id.clone()).or_insert(loc);
        }
        Self {
            items,
            locations: by_item,
        }
    }

    /// Parse a YAML fixture with top-level `items` and `locations` lists
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let fixture: CatalogFixture = serde_yaml::from_str(yaml)
            .map_err(|e| CatalogError::Decode(format!("invalid catalog fixture: {}", e)))?;
        Ok(Self::new(fixture.items, fixture.locations))
    }

    /// Load a YAML fixture from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            CatalogError::Unavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }
}

#[async_trait]
impl CatalogGateway for InMemoryCatalog {
    async fn list_available(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        Ok(self
            .items
            .iter()
            .filter(|item| item.is_available)
            .cloned()
            .collect())
    }

    async fn find_confirmed(
        &self,
        id: &str,
        name: &str,
    ) -> Result<Option<CatalogItem>, CatalogError> {
        Ok(self
            .items
            .iter()
            .find(|item| item.id == id && item.name == name && item.is_available)
            .cloned())
    }

    async fn find_location(&self, id: &str) -> Result<Option<LocationRecord>, CatalogError> {
        Ok(self.locations.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AisleFace, Category};

    const FIXTURE: &str = r#"
items:
  - id: p1
    name: Dark Chocolate Cake
    price: 12.5
    productUrl: https://shop.example/p1
    isAvailable: true
    category: FOOD_AND_FMCG
  - id: p2
    name: Graphite Pencil
    price: 0.99
    isAvailable: false
locations:
  - productId: p1
    floor: 2
    latitude: "12.9716"
    longitude: "77.5946"
    aisle_face: A
    shelf: 4
    start_position: 10
    end_position: 52
"#;

    #[tokio::test]
    async fn test_fixture_round_trip() {
        let catalog = InMemoryCatalog::from_yaml_str(FIXTURE).unwrap();
        assert_eq!(catalog.items().len(), 2);
        assert_eq!(catalog.items()[0].category, Some(Category::FoodAndFmcg));
        assert_eq!(catalog.items()[1].product_url, "");

        let location = catalog.find_location("p1").await.unwrap().unwrap();
        assert_eq!(location.aisle_face, AisleFace::A);
        assert_eq!(location.shelf, 4);
        assert!(catalog.find_location("p2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_available_filters_unavailable() {
        let catalog = InMemoryCatalog::from_yaml_str(FIXTURE).unwrap();
        let available = catalog.list_available().await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, "p1");
    }

    #[tokio::test]
    async fn test_find_confirmed_requires_id_name_and_availability() {
        let catalog = InMemoryCatalog::from_yaml_str(FIXTURE).unwrap();

        assert!(catalog
            .find_confirmed("p1", "Dark Chocolate Cake")
            .await
            .unwrap()
            .is_some());
        // Right id, stale name
        assert!(catalog
            .find_confirmed("p1", "Chocolate Cake")
            .await
            .unwrap()
            .is_none());
        // Exists but unavailable
        assert!(catalog
            .find_confirmed("p2", "Graphite Pencil")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_first_location_record_wins() {
        let yaml = format!(
            "{}  - productId: p1\n    floor: 3\n    latitude: \"0\"\n    longitude: \"0\"\n    aisle_face: B\n    shelf: 9\n    start_position: 1\n    end_position: 41\n",
            FIXTURE
        );
        let catalog = InMemoryCatalog::from_yaml_str(&yaml).unwrap();

        let location = catalog.find_location("p1").await.unwrap().unwrap();
        assert_eq!(location.floor, 2);
        assert_eq!(location.shelf, 4);
    }

    #[test]
    fn test_malformed_fixture() {
        let err = InMemoryCatalog::from_yaml_str("items: 7").unwrap_err();
        assert!(matches!(err, CatalogError::Decode(_)));
    }
}
