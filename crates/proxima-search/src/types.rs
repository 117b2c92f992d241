//! Common types for the similarity search subsystem.
//!
//! These types are shared by the registry, clause builder, executor, and
//! store implementations, and are always available regardless of feature
//! flags.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A result row, as returned by the datastore.
pub type Row = serde_json::Map<String, Value>;

/// Alias under which the raw distance expression is selected.
///
/// Stripped from rows before they are returned to callers.
pub const DISTANCE_COLUMN: &str = "_distance";

/// Key under which the normalized similarity score is attached to rows.
pub const SCORE_FIELD: &str = "_score";

// ============================================================================
// Metrics
// ============================================================================

/// Distance metric for a vector field.
///
/// The operator strings follow the pgvector convention: `<=>` for cosine
/// distance, `<->` for Euclidean (L2) distance, `<#>` for negated inner
/// product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Cosine distance (`1 - cosine similarity`).
    #[default]
    Cosine,
    /// Euclidean distance.
    L2,
    /// Negated inner product.
    InnerProduct,
}

impl Metric {
    /// The SQL distance operator for this metric.
    pub fn operator(&self) -> &'static str {
        match self {
            Metric::Cosine => "<=>",
            Metric::L2 => "<->",
            Metric::InnerProduct => "<#>",
        }
    }

    /// The metric name used in configuration and response metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cosine => "cosine",
            Metric::L2 => "l2",
            Metric::InnerProduct => "inner_product",
        }
    }

    /// Resolve a metric from its configured name.
    ///
    /// Unrecognized names fall back to [`Metric::Cosine`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "l2" | "euclidean" => Metric::L2,
            "inner_product" | "ip" => Metric::InnerProduct,
            _ => Metric::Cosine,
        }
    }
}

// ============================================================================
// Field configuration
// ============================================================================

/// Configuration for a single vector field.
///
/// Constructed once at process start from generated configuration and never
/// mutated at request time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorFieldConfig {
    /// API-facing field name (unique key in the registry).
    pub field_name: String,

    /// Required query vector length.
    pub dimension: usize,

    /// Distance metric for this field.
    #[serde(default)]
    pub metric: Metric,

    /// Advisory index hint (e.g. "hnsw", "ivfflat"); not interpreted here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_type: Option<String>,
}

impl VectorFieldConfig {
    /// Create a new field configuration.
    pub fn new(field_name: impl Into<String>, dimension: usize, metric: Metric) -> Self {
        Self {
            field_name: field_name.into(),
            dimension,
            metric,
            index_type: None,
        }
    }

    /// Set the advisory index hint.
    pub fn with_index_type(mut self, index_type: impl Into<String>) -> Self {
        self.index_type = Some(index_type.into());
        self
    }
}

// ============================================================================
// Search request
// ============================================================================

/// Parameters for a similarity search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// The vector field to search.
    pub field: String,

    /// The query vector; must match the field's registered dimension.
    pub vector: Vec<f32>,

    /// Requested page size (clamped to the executor's hard cap).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Opaque pagination cursor from a previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,

    /// Minimum similarity score; ignored unless greater than zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// Equality/array/null pre-filter conditions, keyed by API field name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filter: BTreeMap<String, Value>,

    /// Whether to attach a normalized `_score` to each row.
    #[serde(default = "default_true")]
    pub include_score: bool,

    /// Columns to select instead of the defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
}

fn default_true() -> bool {
    true
}

impl SearchRequest {
    /// Create a request for a field with a query vector.
    pub fn new(field: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            field: field.into(),
            vector,
            limit: None,
            cursor: None,
            threshold: None,
            filter: BTreeMap::new(),
            include_score: true,
            columns: None,
        }
    }

    /// Set the page size.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the pagination cursor.
    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    /// Set the minimum similarity threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Add a pre-filter condition.
    pub fn with_filter(mut self, field: impl Into<String>, value: Value) -> Self {
        self.filter.insert(field.into(), value);
        self
    }

    /// Select specific columns instead of the defaults.
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Suppress `_score` attachment on returned rows.
    pub fn without_scores(mut self) -> Self {
        self.include_score = false;
        self
    }
}

// ============================================================================
// Executor options
// ============================================================================

/// Executor configuration.
///
/// `table`, `id_column`, and `soft_delete_column` come from generated
/// configuration and are trusted identifiers; they are not caller input and
/// do not pass through the naming transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Table to search.
    pub table: String,

    /// Primary key column; the pagination tie-breaker.
    #[serde(default = "default_id_column")]
    pub id_column: String,

    /// Soft-delete sentinel column (`IS NULL` means live).
    #[serde(default = "default_soft_delete_column")]
    pub soft_delete_column: String,

    /// Page size when the request does not specify one.
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Hard cap on page size.
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

fn default_id_column() -> String {
    "id".to_string()
}

fn default_soft_delete_column() -> String {
    "deleted_at".to_string()
}

fn default_limit() -> usize {
    10
}

fn default_max_limit() -> usize {
    100
}

impl SearchOptions {
    /// Create options for a table, with default columns and limits.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            id_column: default_id_column(),
            soft_delete_column: default_soft_delete_column(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

// ============================================================================
// Search results
// ============================================================================

/// Pagination state returned with each page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    /// Cursor for the next page; `None` on a terminal page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,

    /// Whether further pages exist.
    pub has_more: bool,

    /// Effective page size used for this page.
    pub limit: usize,
}

/// Metadata describing how a page was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMeta {
    /// The searched field.
    pub field: String,

    /// The field's distance metric.
    pub metric: Metric,

    /// The field's registered dimension.
    pub dimension: usize,

    /// The similarity threshold applied, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// Number of rows on this page.
    pub total_matches: usize,
}

/// One page of similarity search results.
///
/// Entirely ephemeral; produced fresh per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage {
    /// Ordered rows, each optionally carrying `_score`.
    pub data: Vec<Row>,

    /// Pagination state.
    pub pagination: PageInfo,

    /// Page metadata.
    pub meta: SearchMeta,
}

// ============================================================================
// Tests
// ============================================================================
