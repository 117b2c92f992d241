//! Embedding similarity search for Proxima.
//!
//! This crate implements nearest-neighbor search over an externally
//! provisioned table: it builds injection-safe parameterized SQL, pages
//! results with a keyset cursor over the composite `(distance, id)`
//! ordering, and converts between raw distances and normalized similarity
//! scores across three metrics.
//!
//! # Features
//!
//! - `store-postgres`: Enable the PostgreSQL/pgvector store backend
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     proxima-search                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  FieldRegistry (immutable field → dimension/metric map)     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SearchExecutor                                             │
//! │  ├── Cursor codec (opaque {score, id} state)                │
//! │  ├── distance ↔ score conversion per metric                 │
//! │  └── ClauseBuilder (typed fragments + bound parameters)     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SearchStore trait                                          │
//! │  ├── MockStore (scripted, always available)                 │
//! │  └── PgStore (feature: store-postgres)                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use proxima_search::{
//!     FieldRegistry, Metric, SearchExecutor, SearchOptions, SearchRequest,
//!     VectorFieldConfig,
//! };
//!
//! let registry = FieldRegistry::new(vec![
//!     VectorFieldConfig::new("embedding", 384, Metric::Cosine).with_index_type("hnsw"),
//! ]);
//! let executor = SearchExecutor::new(registry, store, SearchOptions::new("documents"));
//!
//! let request = SearchRequest::new("embedding", query_vector)
//!     .with_limit(20)
//!     .with_threshold(0.7)
//!     .with_filter("status", serde_json::json!("published"));
//!
//! let page = executor.execute(&request).await?;
//! for row in &page.data {
//!     println!("{}: {}", row["id"], row["_score"]);
//! }
//! if let Some(cursor) = page.pagination.cursor {
//!     // pass back in the next request to continue
//! }
//! ```

// Core modules (always available)
pub mod clause;
pub mod convert;
pub mod cursor;
pub mod executor;
pub mod registry;
pub mod store;
pub mod types;

// Feature-gated store modules
#[cfg(feature = "store-postgres")]
pub mod postgres;

// Re-exports — core types
pub use types::{
    DISTANCE_COLUMN, Metric, PageInfo, Row, SCORE_FIELD, SearchMeta, SearchOptions, SearchPage,
    SearchRequest, VectorFieldConfig,
};

// Re-exports — components
pub use clause::{ClauseBuilder, PredicateList, SqlParam};
pub use convert::{distance_to_score, score_to_distance};
pub use cursor::Cursor;
pub use executor::SearchExecutor;
pub use registry::FieldRegistry;

// Re-exports — store seam
pub use store::{MockStore, RecordedCall, SearchStore};

// Feature-gated re-exports
#[cfg(feature = "store-postgres")]
pub use postgres::PgStore;
