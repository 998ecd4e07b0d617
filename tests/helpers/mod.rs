//! Shared fixtures for pipeline integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use aisle_intent::{
    AisleFace, CatalogError, CatalogGateway, CatalogItem, GenerationError, InMemoryCatalog,
    LocationRecord, TextGenerator,
};

/// Generator that replays canned replies and records every prompt it saw
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<Vec<String>>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<&str>) -> Arc<Self> {
        Self::with_results(replies.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn with_results(replies: Vec<Result<String, GenerationError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompt(&self, index: usize) -> Vec<String> {
        self.prompts.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, parts: &[String]) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(parts.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("I could not find anything.".to_string()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Catalog whose every query fails as if the store were down
pub struct UnreachableCatalog;

#[async_trait]
impl CatalogGateway for UnreachableCatalog {
    async fn list_available(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        Err(CatalogError::Unavailable("connection refused".into()))
    }

    async fn find_confirmed(
        &self,
        _id: &str,
        _name: &str,
    ) -> Result<Option<CatalogItem>, CatalogError> {
        Err(CatalogError::Unavailable("connection refused".into()))
    }

    async fn find_location(&self, _id: &str) -> Result<Option<LocationRecord>, CatalogError> {
        Err(CatalogError::Unavailable("connection refused".into()))
    }
}

pub fn item(id: &str, name: &str, cents: i64) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        name: name.to_string(),
        price: Decimal::new(cents, 2),
        product_url: format!("https://shop.example/p/{}", id),
        is_available: true,
        category: None,
    }
}

pub fn location(id: &str, shelf: i32) -> LocationRecord {
    LocationRecord {
        item_id: id.to_string(),
        floor: 1,
        latitude: "12.9716".to_string(),
        longitude: "77.5946".to_string(),
        aisle_face: AisleFace::A,
        shelf,
        start_position: 10,
        end_position: 20,
    }
}

/// p1 and p4 are located, p2 is not, p5 is out of stock
pub fn store_catalog() -> Arc<InMemoryCatalog> {
    Arc::new(store_items())
}

pub fn store_items() -> InMemoryCatalog {
    let mut pencil = item("p5", "Graphite Pencil HB", 99);
    pencil.is_available = false;
    InMemoryCatalog::new(
        vec![
            item("p1", "Dark Chocolate Cake", 1250),
            item("p2", "Cocoa Powder 250g", 420),
            item("p4", "Refined Steel Graphics Card", 49900),
            pencil,
        ],
        vec![location("p1", 2), location("p4", 7)],
    )
}

/// Wraps a catalog and records the peak number of concurrent lookups
pub struct TrackingCatalog {
    inner: InMemoryCatalog,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl TrackingCatalog {
    pub fn new(inner: InMemoryCatalog) -> Arc<Self> {
        Arc::new(Self {
            inner,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn tracked<T>(&self, lookup: impl std::future::Future<Output = T>) -> T {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        let result = lookup.await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl CatalogGateway for TrackingCatalog {
    async fn list_available(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        self.inner.list_available().await
    }

    async fn find_confirmed(
        &self,
        id: &str,
        name: &str,
    ) -> Result<Option<CatalogItem>, CatalogError> {
        self.tracked(self.inner.find_confirmed(id, name)).await
    }

    async fn find_location(&self, id: &str) -> Result<Option<LocationRecord>, CatalogError> {
        self.tracked(self.inner.find_location(id)).await
    }
}
