//! Postgres catalog gateway
//!
//! Read-only queries against the store's `"Product"` and `"ProductAdress"`
//! tables. Every query is bounded by `query_timeout` so a slow store fails
//! the request instead of hanging it.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use tracing::{debug, info, warn};

use super::{CatalogError, CatalogGateway, CatalogItem, LocationRecord};

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub connection_timeout: Duration,
    pub query_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost:5432/store".to_string()),
            max_connections: std::env::var("DATABASE_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            connection_timeout: Duration::from_secs(30),
            query_timeout: Duration::from_secs(
                std::env::var("DATABASE_QUERY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            idle_timeout: Some(Duration::from_secs(600)), // 10 minutes
            max_lifetime: Some(Duration::from_secs(1800)), // 30 minutes
        }
    }
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                CatalogError::Unavailable(e.to_string())
            }
            other => CatalogError::Query(other.to_string()),
        }
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    name: String,
    price: Option<Decimal>,
    product_url: Option<String>,
    is_available: bool,
    category: Option<String>,
}

impl TryFrom<ProductRow> for CatalogItem {
    type Error = CatalogError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(CatalogItem {
            id: row.id,
            name: row.name,
            price: row.price.unwrap_or_default(),
            product_url: row.product_url.unwrap_or_default(),
            is_available: row.is_available,
            category: row.category.as_deref().map(str::parse).transpose()?,
        })
    }
}

#[derive(Debug, FromRow)]
struct LocationRow {
    product_id: String,
    floor: i32,
    latitude: String,
    longitude: String,
    aisle_face: String,
    shelf: i32,
    start_position: i32,
    end_position: i32,
}

impl TryFrom<LocationRow> for LocationRecord {
    type Error = CatalogError;

    fn try_from(row: LocationRow) -> Result<Self, Self::Error> {
        Ok(LocationRecord {
            item_id: row.product_id,
            floor: row.floor,
            latitude: row.latitude,
            longitude: row.longitude,
            aisle_face: row.aisle_face.parse()?,
            shelf: row.shelf,
            start_position: row.start_position,
            end_position: row.end_position,
        })
    }
}

const PRODUCT_COLUMNS: &str = r#"id, name, price::numeric AS price, "productUrl" AS product_url, "isAvailable" AS is_available, category::text AS category"#;

/// Catalog gateway over a Postgres pool
#[derive(Clone, Debug)]
pub struct PgCatalog {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgCatalog {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    /// Build a pool from configuration and wrap it
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, CatalogError> {
        info!(
            "Connecting to catalog database: {}",
            mask_database_url(&config.database_url)
        );

        let mut pool_options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connection_timeout);

        if let Some(idle_timeout) = config.idle_timeout {
            pool_options = pool_options.idle_timeout(idle_timeout);
        }

        if let Some(max_lifetime) = config.max_lifetime {
            pool_options = pool_options.max_lifetime(max_lifetime);
        }

        let pool = pool_options
            .connect(&config.database_url)
            .await
            .map_err(|e| {
                warn!("Failed to connect to catalog database: {}", e);
                CatalogError::Unavailable(e.to_string())
            })?;

        info!("Catalog connection pool created successfully");
        Ok(Self::new(pool, config.query_timeout))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn bounded<T, F>(&self, query: F) -> Result<T, CatalogError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, query).await {
            Ok(result) => result.map_err(CatalogError::from),
            Err(_) => Err(CatalogError::Timeout(self.query_timeout.as_secs())),
        }
    }
}

#[async_trait]
impl CatalogGateway for PgCatalog {
    async fn list_available(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        let sql = format!(
            r#"SELECT {} FROM "Product" WHERE "isAvailable" = true ORDER BY name"#,
            PRODUCT_COLUMNS
        );
        let rows = self
            .bounded(sqlx::query_as::<_, ProductRow>(&sql).fetch_all(&self.pool))
            .await?;
        debug!(count = rows.len(), "Loaded available catalog items");
        rows.into_iter().map(CatalogItem::try_from).collect()
    }

    async fn find_confirmed(
        &self,
        id: &str,
        name: &str,
    ) -> Result<Option<CatalogItem>, CatalogError> {
        let sql = format!(
            r#"SELECT {} FROM "Product" WHERE id = $1 AND name = $2 AND "isAvailable" = true LIMIT 1"#,
            PRODUCT_COLUMNS
        );
        let row = self
            .bounded(
                sqlx::query_as::<_, ProductRow>(&sql)
                    .bind(id)
                    .bind(name)
                    .fetch_optional(&self.pool),
            )
            .await?;
        row.map(CatalogItem::try_from).transpose()
    }

    async fn find_location(&self, id: &str) -> Result<Option<LocationRecord>, CatalogError> {
        let row = self
            .bounded(
                sqlx::query_as::<_, LocationRow>(
                    r#"SELECT "productId" AS product_id, floor, latitude, longitude, aisle_face::text AS aisle_face, shelf, start_position, end_position FROM "ProductAdress" WHERE "productId" = $1 LIMIT 1"#,
                )
                .bind(id)
                .fetch_optional(&self.pool),
            )
            .await?;
        row.map(LocationRecord::try_from).transpose()
    }
}

/// Mask sensitive information in database URL for logging
fn mask_database_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut masked = parsed.clone();
        if parsed.password().is_some() {
            let _ = masked.set_password(Some("***"));
        }
        masked.to_string()
    } else {
        "invalid_url".to_string()
    }
}
