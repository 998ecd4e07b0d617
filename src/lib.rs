//! Shopping intent resolution
//!
//! Turns a free-text shopping request into a list of catalog items that
//! provably exist and are available, each annotated with its physical
//! location in the store.
//!
//! ## Architecture
//!
//! ```text
//! Request → IntentResolver → Sanitize → Parse → SchemaValidator
//!                               ↑                     │ (rejected)
//!                               └── CorrectionLoop ←──┘
//!        → CatalogCrossChecker → LocationResolver → ResultAssembler
//! ```
//!
//! The generative text service is never trusted: every item in a
//! [`ResolutionResult`] is re-derived from the [`CatalogGateway`].
//!
//! ## Features
//!
//! - `database`: Postgres-backed [`catalog::PgCatalog`]
//! - `server`: axum REST adapter and the `intent_server` binary

pub mod catalog;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;

#[cfg(feature = "server")]
pub mod api;

// Re-exports for convenience
pub use catalog::{
    AisleFace, CatalogError, CatalogGateway, CatalogItem, Category, InMemoryCatalog,
    LocationRecord,
};
pub use config::{DisambiguationHint, ResolverConfig};
pub use error::{Failure, FailureKind, ResolveError};
pub use llm::{GenerationError, TextGenerator};
pub use pipeline::{ConfirmedItem, IntentPipeline, ResolutionResult, MAX_CONCURRENT_LOOKUPS};

#[cfg(feature = "database")]
pub use catalog::{DatabaseConfig, PgCatalog};
