//! Intent Resolution REST API Server
//!
//! Serves the intent pipeline over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! # Against Postgres
//! DATABASE_URL=postgresql://localhost/store GEMINI_API_KEY=... \
//!   cargo run --bin intent_server --features server
//!
//! # Against a YAML fixture instead of a database
//! CATALOG_FIXTURE=fixtures/catalog.yaml GEMINI_API_KEY=... \
//!   cargo run --bin intent_server --features server
//!
//! curl -X POST http://localhost:3000/api/gemini/list \
//!   -H "Content-Type: application/json" \
//!   -d '{"text": "I want to bake a chocolate cake"}'
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aisle_intent::api::create_intent_router;
use aisle_intent::{
    CatalogGateway, DatabaseConfig, InMemoryCatalog, IntentPipeline, PgCatalog, ResolverConfig,
};

/// Default server port
const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aisle_intent=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting intent resolution server");

    let catalog: Arc<dyn CatalogGateway> = match std::env::var("CATALOG_FIXTURE") {
        Ok(path) => {
            tracing::info!(%path, "Loading catalog fixture");
            Arc::new(InMemoryCatalog::from_file(&path).context("loading catalog fixture")?)
        }
        Err(_) => Arc::new(
            PgCatalog::connect(&DatabaseConfig::default())
                .await
                .context("connecting to catalog database")?,
        ),
    };

    let config = ResolverConfig::from_env();
    tracing::info!(
        model = %config.model,
        max_attempts = config.max_attempts,
        configured = config.is_configured(),
        "Resolver configuration loaded"
    );

    let pipeline = IntentPipeline::from_config(&config, catalog)
        .context("building intent pipeline")?;

    let app = create_intent_router(Arc::new(pipeline))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
