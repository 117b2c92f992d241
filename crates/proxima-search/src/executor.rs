//! Search execution.
//!
//! Orchestrates one similarity search call: validate against the registry,
//! resolve the page size, decode the cursor, build the clauses, run exactly
//! one parameterized query, and shape the result envelope.
//!
//! The executor over-fetches one row beyond the page size; a full
//! `limit + 1` result proves further pages exist without a separate count
//! query. The extra row is dropped from the page and the next cursor is
//! built from the last retained row.
//!
//! There is no internal retry, caching, or shared mutable state; each call
//! is a pure function of its inputs plus the immutable registry.

use std::sync::Arc;

use serde_json::Value;

use proxima_core::{Error, Result};

use crate::clause::{ClauseBuilder, SqlParam};
use crate::convert::distance_to_score;
use crate::cursor::Cursor;
use crate::registry::FieldRegistry;
use crate::store::SearchStore;
use crate::types::{
    DISTANCE_COLUMN, PageInfo, Row, SCORE_FIELD, SearchMeta, SearchOptions, SearchPage,
    SearchRequest,
};

/// Executes similarity searches against a datastore.
///
/// Holds the immutable [`FieldRegistry`], the [`SearchStore`] collaborator,
/// and the executor options. Cloning is cheap; all state is shared behind
/// `Arc` and read-only.
#[derive(Clone)]
pub struct SearchExecutor {
    registry: Arc<FieldRegistry>,
    store: Arc<dyn SearchStore>,
    options: SearchOptions,
}

impl SearchExecutor {
    /// Create an executor.
    pub fn new(registry: FieldRegistry, store: Arc<dyn SearchStore>, options: SearchOptions) -> Self {
        Self {
            registry: Arc::new(registry),
            store,
            options,
        }
    }

    /// The field registry, for introspection by surrounding layers.
    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Execute one similarity search.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the field is not registered and
    /// [`Error::DimensionMismatch`] if the query vector has the wrong
    /// length; both are raised before any query is issued. Store failures
    /// propagate unmodified.
    pub async fn execute(&self, request: &SearchRequest) -> Result<SearchPage> {
        let config = self.registry.get(&request.field).ok_or_else(|| {
            Error::config(format!(
                "'{}' is not a registered vector field",
                request.field
            ))
        })?;

        if request.vector.len() != config.dimension {
            return Err(Error::dimension_mismatch(
                &request.field,
                config.dimension,
                request.vector.len(),
            ));
        }

        let limit = request
            .limit
            .unwrap_or(self.options.default_limit)
            .min(self.options.max_limit)
            .max(1);

        // Fail-open: a malformed cursor restarts from the first page
        let cursor = request.cursor.as_deref().and_then(Cursor::decode);

        let builder = ClauseBuilder::new(config, &self.options);
        let mut clauses = builder.build_where(
            &request.vector,
            &request.filter,
            request.threshold,
            cursor.as_ref(),
        )?;

        let select = builder.select_sql(request.columns.as_deref(), true);
        let order_by = builder.order_by_sql();
        let limit_idx = clauses.bind(SqlParam::Int(limit as i64 + 1));

        let sql = format!(
            "{select} FROM {table} {where_clause} {order_by} LIMIT ${limit_idx}",
            table = self.options.table,
            where_clause = clauses.where_sql(),
        );

        log::debug!(
            "vector search: field={} metric={} limit={} filters={} cursor={}",
            request.field,
            config.metric.as_str(),
            limit,
            request.filter.len(),
            cursor.is_some(),
        );

        let mut rows = self.store.fetch_all(&sql, clauses.params()).await?;

        let has_more = rows.len() > limit;
        if has_more {
            rows.truncate(limit);
        }

        let next_cursor = if has_more {
            rows.last().and_then(|row| {
                let distance = row.get(DISTANCE_COLUMN)?.as_f64()?;
                let id = id_string(row.get(&self.options.id_column)?);
                Some(Cursor::new(distance_to_score(distance, config.metric), id).encode())
            })
        } else {
            None
        };

        for row in &mut rows {
            let distance = row.remove(DISTANCE_COLUMN).and_then(|v| v.as_f64());
            if request.include_score {
                if let Some(distance) = distance {
                    let score = distance_to_score(distance, config.metric);
                    row.insert(SCORE_FIELD.to_string(), score.into());
                }
            }
        }

        Ok(SearchPage {
            meta: SearchMeta {
                field: request.field.clone(),
                metric: config.metric,
                dimension: config.dimension,
                threshold: request.threshold,
                total_matches: rows.len(),
            },
            pagination: PageInfo {
                cursor: next_cursor,
                has_more,
                limit,
            },
            data: rows,
        })
    }
}

impl std::fmt::Debug for SearchExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchExecutor")
            .field("fields", &self.registry.len())
            .field("store", &self.store.name())
            .field("table", &self.options.table)
            .finish()
    }
}

/// Render a row id as the string carried in cursors.
fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::score_to_distance;
    use crate::registry::FieldRegistry;
    use crate::store::MockStore;
    use crate::types::{Metric, VectorFieldConfig};
    use serde_json::json;

    fn make_executor(store: Arc<MockStore>) -> SearchExecutor {
        let registry = FieldRegistry::new(vec![
            VectorFieldConfig::new("embedding", 3, Metric::Cosine),
            VectorFieldConfig::new("titleEmbedding", 4, Metric::L2),
        ]);
        SearchExecutor::new(registry, store, SearchOptions::new("documents"))
    }

    fn make_row(id: &str, distance: f64) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), json!(id));
        row.insert("created_at".into(), json!("2025-06-01T00:00:00Z"));
        row.insert("updated_at".into(), json!("2025-06-02T00:00:00Z"));
        row.insert(DISTANCE_COLUMN.into(), json!(distance));
        row
    }

    // ------------------------------------------------------------------------
    // Validation tests
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_unregistered_field_fails_without_query() {
        let store = Arc::new(MockStore::new());
        let executor = make_executor(store.clone());

        let request = SearchRequest::new("body", vec![0.0; 3]);
        let err = executor.execute(&request).await.unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_fails_without_query() {
        let store = Arc::new(MockStore::new());
        let executor = make_executor(store.clone());

        let request = SearchRequest::new("embedding", vec![0.0; 5]);
        let err = executor.execute(&request).await.unwrap_err();

        match err {
            Error::DimensionMismatch {
                field,
                expected,
                actual,
            } => {
                assert_eq!(field, "embedding");
                assert_eq!(expected, 3);
                assert_eq!(actual, 5);
            }
            other => panic!("expected DimensionMismatch, got {other:?}"),
        }
        assert_eq!(store.call_count(), 0);
    }

    // ------------------------------------------------------------------------
    // Query shape tests
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_emitted_sql_shape() {
        let store = Arc::new(MockStore::new());
        let executor = make_executor(store.clone());

        let request = SearchRequest::new("embedding", vec![0.1, 0.2, 0.3]).with_limit(2);
        executor.execute(&request).await.unwrap();

        let calls = store.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].sql,
            "SELECT id, created_at, updated_at, embedding <=> $1::vector AS _distance \
             FROM documents \
             WHERE deleted_at IS NULL \
             ORDER BY embedding <=> $1::vector ASC, id ASC \
             LIMIT $2"
        );
        assert_eq!(
            calls[0].params,
            vec![
                SqlParam::Vector(vec![0.1, 0.2, 0.3]),
                SqlParam::Int(3), // limit + 1
            ]
        );
    }

    #[tokio::test]
    async fn test_over_fetch_detects_more_pages() {
        let store = Arc::new(MockStore::new());
        store.push_response(vec![
            make_row("a", 0.1),
            make_row("b", 0.2),
            make_row("c", 0.2),
        ]);
        let executor = make_executor(store.clone());

        let request = SearchRequest::new("embedding", vec![0.1, 0.2, 0.3]).with_limit(2);
        let page = executor.execute(&request).await.unwrap();

        assert!(page.pagination.has_more);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.meta.total_matches, 2);

        // Cursor encodes the last retained row (b), not the dropped one
        let cursor = Cursor::decode(page.pagination.cursor.as_deref().unwrap()).unwrap();
        assert_eq!(cursor.id, "b");
        assert!((cursor.score - 0.8).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_terminal_page_has_no_cursor() {
        let store = Arc::new(MockStore::new());
        store.push_response(vec![make_row("a", 0.1), make_row("b", 0.2)]);
        let executor = make_executor(store.clone());

        let request = SearchRequest::new("embedding", vec![0.1, 0.2, 0.3]).with_limit(2);
        let page = executor.execute(&request).await.unwrap();

        assert!(!page.pagination.has_more);
        assert!(page.pagination.cursor.is_none());
        assert_eq!(page.data.len(), 2);
    }

    #[tokio::test]
    async fn test_rows_carry_score_and_lose_distance() {
        let store = Arc::new(MockStore::new());
        store.push_response(vec![make_row("a", 0.25)]);
        let executor = make_executor(store.clone());

        let request = SearchRequest::new("embedding", vec![0.1, 0.2, 0.3]);
        let page = executor.execute(&request).await.unwrap();

        let row = &page.data[0];
        assert!(row.get(DISTANCE_COLUMN).is_none());
        let score = row.get(SCORE_FIELD).unwrap().as_f64().unwrap();
        assert!((score - 0.75).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_include_score_false_suppresses_score() {
        let store = Arc::new(MockStore::new());
        store.push_response(vec![make_row("a", 0.25)]);
        let executor = make_executor(store.clone());

        let request = SearchRequest::new("embedding", vec![0.1, 0.2, 0.3]).without_scores();
        let page = executor.execute(&request).await.unwrap();

        let row = &page.data[0];
        assert!(row.get(SCORE_FIELD).is_none());
        assert!(row.get(DISTANCE_COLUMN).is_none());
    }

    #[tokio::test]
    async fn test_limit_clamped_to_max() {
        let store = Arc::new(MockStore::new());
        let executor = make_executor(store.clone());

        let request = SearchRequest::new("embedding", vec![0.0; 3]).with_limit(5000);
        let page = executor.execute(&request).await.unwrap();

        assert_eq!(page.pagination.limit, 100);
        let calls = store.calls();
        assert_eq!(*calls[0].params.last().unwrap(), SqlParam::Int(101));
    }

    #[tokio::test]
    async fn test_default_limit_applies() {
        let store = Arc::new(MockStore::new());
        let executor = make_executor(store.clone());

        let request = SearchRequest::new("embedding", vec![0.0; 3]);
        let page = executor.execute(&request).await.unwrap();

        assert_eq!(page.pagination.limit, 10);
    }

    #[tokio::test]
    async fn test_malformed_cursor_restarts_from_first_page() {
        let store = Arc::new(MockStore::new());
        let executor = make_executor(store.clone());

        let request = SearchRequest::new("embedding", vec![0.0; 3]).with_cursor("!!corrupt!!");
        executor.execute(&request).await.unwrap();

        // No keyset predicate: only the vector and the limit are bound
        let calls = store.calls();
        assert_eq!(calls[0].params.len(), 2);
        assert!(!calls[0].sql.contains("OR ("));
    }

    #[tokio::test]
    async fn test_valid_cursor_adds_keyset_predicate() {
        let store = Arc::new(MockStore::new());
        let executor = make_executor(store.clone());

        let cursor = Cursor::new(0.8, "doc-b").encode();
        let request = SearchRequest::new("embedding", vec![0.0; 3]).with_cursor(cursor);
        executor.execute(&request).await.unwrap();

        let calls = store.calls();
        assert!(calls[0].sql.contains(
            "(embedding <=> $1::vector > $2 OR (embedding <=> $1::vector = $2 AND id > $3))"
        ));
        match calls[0].params[1] {
            SqlParam::Float(distance) => assert!((distance - 0.2).abs() < 1e-9),
            ref other => panic!("expected Float distance, got {other:?}"),
        }
        assert_eq!(calls[0].params[2], SqlParam::Text("doc-b".into()));
    }

    #[tokio::test]
    async fn test_filters_and_threshold_reach_the_store() {
        let store = Arc::new(MockStore::new());
        let executor = make_executor(store.clone());

        let request = SearchRequest::new("embedding", vec![0.0; 3])
            .with_filter("status", json!("published"))
            .with_threshold(0.5);
        executor.execute(&request).await.unwrap();

        let calls = store.calls();
        assert!(calls[0].sql.contains("status = $2"));
        assert!(calls[0].sql.contains("embedding <=> $1::vector < $3"));
        assert_eq!(calls[0].params[1], SqlParam::Text("published".into()));
    }

    #[tokio::test]
    async fn test_meta_reflects_field_config() {
        let store = Arc::new(MockStore::new());
        let executor = make_executor(store.clone());

        let request =
            SearchRequest::new("titleEmbedding", vec![0.0; 4]).with_threshold(0.25);
        let page = executor.execute(&request).await.unwrap();

        assert_eq!(page.meta.field, "titleEmbedding");
        assert_eq!(page.meta.metric, Metric::L2);
        assert_eq!(page.meta.dimension, 4);
        assert_eq!(page.meta.threshold, Some(0.25));
    }

    #[test]
    fn test_registry_introspection() {
        let store = Arc::new(MockStore::new());
        let executor = make_executor(store);

        assert!(executor.registry().has("embedding"));
        assert!(!executor.registry().has("body"));
        assert_eq!(
            executor.registry().names(),
            vec!["embedding", "titleEmbedding"]
        );
        assert_eq!(executor.registry().get("embedding").unwrap().dimension, 3);
    }

    #[tokio::test]
    async fn test_exactly_one_query_per_call() {
        let store = Arc::new(MockStore::new());
        store.push_response(vec![make_row("a", 0.1); 11]);
        let executor = make_executor(store.clone());

        let request = SearchRequest::new("embedding", vec![0.0; 3]);
        executor.execute(&request).await.unwrap();

        assert_eq!(store.call_count(), 1);
    }

    // ------------------------------------------------------------------------
    // Pagination walk: the worked example from the pagination contract
    // ------------------------------------------------------------------------

    /// Five rows with distances [0.1, 0.2, 0.2, 0.3, 0.4] and ids [a..e],
    /// walked with limit 2: pages [a, b], [c, d], [e]. Row c ties b's
    /// distance and is reached through the id tie-breaker.
    #[tokio::test]
    async fn test_three_page_walk_no_duplicates_no_skips() {
        let dataset = [
            ("a", 0.1),
            ("b", 0.2),
            ("c", 0.2),
            ("d", 0.3),
            ("e", 0.4),
        ];
        let store = Arc::new(MockStore::new());
        let executor = make_executor(store.clone());

        // Page 1: store returns limit + 1 = 3 rows
        store.push_response(dataset[..3].iter().map(|(id, d)| make_row(id, *d)).collect());
        let request = SearchRequest::new("embedding", vec![0.1, 0.2, 0.3]).with_limit(2);
        let page1 = executor.execute(&request).await.unwrap();

        let ids: Vec<&str> = page1
            .data
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(page1.pagination.has_more);

        let cursor1 = Cursor::decode(page1.pagination.cursor.as_deref().unwrap()).unwrap();
        assert_eq!(cursor1.id, "b");
        assert!((score_to_distance(cursor1.score, Metric::Cosine) - 0.2).abs() < 1e-9);

        // Page 2: the keyset predicate must ask for rows strictly after (0.2, b)
        store.push_response(dataset[2..].iter().map(|(id, d)| make_row(id, *d)).collect());
        let request2 = request
            .clone()
            .with_cursor(page1.pagination.cursor.clone().unwrap());
        let page2 = executor.execute(&request2).await.unwrap();

        let call = &store.calls()[1];
        match call.params[1] {
            SqlParam::Float(d) => assert!((d - 0.2).abs() < 1e-9),
            ref other => panic!("expected Float distance, got {other:?}"),
        }
        assert_eq!(call.params[2], SqlParam::Text("b".into()));

        let ids: Vec<&str> = page2
            .data
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["c", "d"]);
        assert!(page2.pagination.has_more);

        // Page 3: terminal
        store.push_response(vec![make_row("e", 0.4)]);
        let request3 = request
            .clone()
            .with_cursor(page2.pagination.cursor.clone().unwrap());
        let page3 = executor.execute(&request3).await.unwrap();

        let ids: Vec<&str> = page3
            .data
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["e"]);
        assert!(!page3.pagination.has_more);
        assert!(page3.pagination.cursor.is_none());

        // Across the walk: every row exactly once, in (distance, id) order
        let walked: Vec<String> = [&page1, &page2, &page3]
            .iter()
            .flat_map(|p| p.data.iter().map(|r| r["id"].as_str().unwrap().to_string()))
            .collect();
        assert_eq!(walked, vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_store_errors_propagate_unmodified() {
        struct FailingStore;

        #[async_trait::async_trait]
        impl SearchStore for FailingStore {
            async fn fetch_all(&self, _sql: &str, _params: &[SqlParam]) -> Result<Vec<Row>> {
                Err(Error::store(std::io::Error::other("connection reset")))
            }

            fn name(&self) -> &str {
                "failing"
            }
        }

        let registry =
            FieldRegistry::new(vec![VectorFieldConfig::new("embedding", 3, Metric::Cosine)]);
        let executor = SearchExecutor::new(
            registry,
            Arc::new(FailingStore),
            SearchOptions::new("documents"),
        );

        let request = SearchRequest::new("embedding", vec![0.0; 3]);
        let err = executor.execute(&request).await.unwrap_err();

        assert!(err.is_store());
        assert!(err.to_string().contains("connection reset"));
    }
}
