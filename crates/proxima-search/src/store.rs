//! Datastore seam.
//!
//! This module defines the `SearchStore` trait that abstracts the raw
//! parameterized query primitive the executor talks to. The store performs
//! standard positional parameter binding and nothing else; all query
//! construction stays on this side of the seam.
//!
//! # Stores
//!
//! - `MockStore`: scripted responses with call recording, for testing
//! - `PgStore`: PostgreSQL with pgvector (requires the `store-postgres`
//!   feature)

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use proxima_core::Result;

use crate::clause::SqlParam;
use crate::types::Row;

/// A raw parameterized query primitive.
///
/// One call executes one statement with positional parameters and returns
/// the full result set as row mappings. Implementations must not retry,
/// suppress, or translate failures; errors propagate to the caller
/// unmodified.
#[async_trait]
pub trait SearchStore: Send + Sync {
    /// Execute a statement, binding `params` positionally (`$1`, `$2`, ...).
    async fn fetch_all(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Row>>;

    /// The store name for diagnostics.
    fn name(&self) -> &str;
}

/// One recorded `fetch_all` invocation.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// The statement text as received.
    pub sql: String,
    /// The bound parameters, in order.
    pub params: Vec<SqlParam>,
}

/// A scripted store for testing.
///
/// Responses are served in FIFO order, one per `fetch_all` call; when the
/// script runs dry, an empty result set is returned. Every call is recorded
/// so tests can assert on the exact statement and bind order the executor
/// produced.
#[derive(Debug, Default)]
pub struct MockStore {
    responses: Mutex<VecDeque<Vec<Row>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockStore {
    /// Create a store with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next unserved call.
    pub fn push_response(&self, rows: Vec<Row>) {
        self.responses.lock().expect("mock poisoned").push_back(rows);
    }

    /// All recorded calls so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("mock poisoned").clone()
    }

    /// Number of calls served.
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock poisoned").len()
    }
}

#[async_trait]
impl SearchStore for MockStore {
    async fn fetch_all(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Row>> {
        self.calls.lock().expect("mock poisoned").push(RecordedCall {
            sql: sql.to_string(),
            params: params.to_vec(),
        });

        let rows = self
            .responses
            .lock()
            .expect("mock poisoned")
            .pop_front()
            .unwrap_or_default();
        Ok(rows)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: &str) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), json!(id));
        row
    }

    #[tokio::test]
    async fn test_mock_serves_responses_in_order() {
        let store = MockStore::new();
        store.push_response(vec![row("a")]);
        store.push_response(vec![row("b"), row("c")]);

        let first = store.fetch_all("SELECT 1", &[]).await.unwrap();
        let second = store.fetch_all("SELECT 2", &[]).await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
        assert_eq!(second[0]["id"], json!("b"));
    }

    #[tokio::test]
    async fn test_mock_empty_script_returns_no_rows() {
        let store = MockStore::new();
        let rows = store.fetch_all("SELECT 1", &[]).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_mock_records_calls() {
        let store = MockStore::new();
        store
            .fetch_all("SELECT * FROM t WHERE a = $1", &[SqlParam::Int(7)])
            .await
            .unwrap();

        let calls = store.calls();
        assert_eq!(store.call_count(), 1);
        assert_eq!(calls[0].sql, "SELECT * FROM t WHERE a = $1");
        assert_eq!(calls[0].params, vec![SqlParam::Int(7)]);
    }

    #[test]
    fn test_trait_object_safety() {
        fn _assert_object_safe(_: &dyn SearchStore) {}
    }
}
