//! Catalog Gateway
//!
//! Read-only query interface over the catalog store. The pipeline treats
//! everything returned from here as ground truth for the duration of a
//! request and never writes back.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

mod memory;
#[cfg(feature = "database")]
mod postgres;

pub use memory::InMemoryCatalog;
#[cfg(feature = "database")]
pub use postgres::{DatabaseConfig, PgCatalog};

/// A purchasable item as recorded in the catalog store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    /// Referral URL, empty when the store has none
    #[serde(default, rename = "productUrl")]
    pub product_url: String,
    #[serde(rename = "isAvailable")]
    pub is_available: bool,
    #[serde(default)]
    pub category: Option<Category>,
}

/// Store department an item is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    FoodAndFmcg,
    Stationery,
    ElectronicsAndElectricalEquipment,
    Hardware,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::FoodAndFmcg => "FOOD_AND_FMCG",
            Category::Stationery => "STATIONERY",
            Category::ElectronicsAndElectricalEquipment => "ELECTRONICS_AND_ELECTRICAL_EQUIPMENT",
            Category::Hardware => "HARDWARE",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "FOOD_AND_FMCG" => Ok(Category::FoodAndFmcg),
            "STATIONERY" => Ok(Category::Stationery),
            "ELECTRONICS_AND_ELECTRICAL_EQUIPMENT" => Ok(Category::ElectronicsAndElectricalEquipment),
            "HARDWARE" => Ok(Category::Hardware),
            other => Err(CatalogError::Decode(format!("unknown category '{}'", other))),
        }
    }
}

/// Which side of the aisle a shelf faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AisleFace {
    A,
    B,
}

impl FromStr for AisleFace {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(AisleFace::A),
            "B" | "b" => Ok(AisleFace::B),
            other => Err(CatalogError::Decode(format!("unknown aisle face '{}'", other))),
        }
    }
}

/// Physical location of an item in the store
///
/// `start_position < end_position` is expected but not enforced here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Identity of the catalog item this record belongs to
    #[serde(rename = "productId")]
    pub item_id: String,
    pub floor: i32,
    pub latitude: String,
    pub longitude: String,
    pub aisle_face: AisleFace,
    pub shelf: i32,
    pub start_position: i32,
    pub end_position: i32,
}

/// Errors raised by catalog store implementations
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog store unavailable: {0}")]
    Unavailable(String),
    #[error("Catalog query timed out after {0} seconds")]
    Timeout(u64),
    #[error("Catalog row could not be decoded: {0}")]
    Decode(String),
    #[error("Catalog query failed: {0}")]
    Query(String),
}

/// Read-only catalog queries consumed by the pipeline
///
/// Implementations must be Send + Sync and must enforce their own
/// timeouts; callers assume every call eventually returns.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// All items currently marked available
    async fn list_available(&self) -> Result<Vec<CatalogItem>, CatalogError>;

    /// Look up an item by identity AND exact name, only if it is available
    async fn find_confirmed(&self, id: &str, name: &str)
        -> Result<Option<CatalogItem>, CatalogError>;

    /// Location record for an item, if the store has one
    async fn find_location(&self, id: &str) -> Result<Option<LocationRecord>, CatalogError>;
}
