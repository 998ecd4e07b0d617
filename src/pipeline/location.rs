//! Location Resolver

use std::sync::Arc;

use futures::{stream, StreamExt, TryStreamExt};
use tracing::debug;

use super::cross_check::{ConfirmedItem, MAX_CONCURRENT_LOOKUPS};
use crate::catalog::{CatalogError, CatalogGateway, LocationRecord};

/// Fetches physical locations for confirmed items
///
/// Items without a location record are skipped; callers correlate
/// locations to items by `item_id`, not by position.
pub struct LocationResolver {
    catalog: Arc<dyn CatalogGateway>,
}

impl LocationResolver {
    pub fn new(catalog: Arc<dyn CatalogGateway>) -> Self {
        Self { catalog }
    }

    pub async fn locate(&self, items: &[ConfirmedItem]) -> Result<Vec<LocationRecord>, CatalogError> {
        let found: Vec<Option<LocationRecord>> = stream::iter(items)
            .map(|item| async move {
                let location = self.catalog.find_location(&item.id).await?;
                if location.is_none() {
                    debug!(id = %item.id, "No location record for item");
                }
                Ok::<_, CatalogError>(location)
            })
            .buffered(MAX_CONCURRENT_LOOKUPS)
            .try_collect()
            .await?;

        Ok(found.into_iter().flatten().collect())
    }
}
