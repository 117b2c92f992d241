//! PostgreSQL store backend.
//!
//! Implements [`SearchStore`] over a `sqlx` connection pool against a table
//! with a pgvector column. Parameters are bound positionally; the query
//! vector is rendered as the pgvector text literal (`[0.1,0.2,...]`) and
//! cast server-side via the `::vector` cast the clause builder emits at
//! each use site.
//!
//! # Feature Gate
//!
//! This module requires the `store-postgres` feature.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPool, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row as _, TypeInfo};

use proxima_core::{Error, Result};

use crate::clause::{SqlParam, vector_literal};
use crate::store::SearchStore;
use crate::types::Row;

/// PostgreSQL-backed search store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SearchStore for PgStore {
    async fn fetch_all(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Row>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_param(query, param);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(Error::store)?;
        rows.iter().map(row_to_json).collect()
    }

    fn name(&self) -> &str {
        "postgres"
    }
}

/// Bind one typed parameter to a query.
fn bind_param<'q>(
    query: Query<'q, Postgres, PgArguments>,
    param: &SqlParam,
) -> Query<'q, Postgres, PgArguments> {
    match param {
        SqlParam::Text(v) => query.bind(v.clone()),
        SqlParam::Float(v) => query.bind(*v),
        SqlParam::Int(v) => query.bind(*v),
        SqlParam::Bool(v) => query.bind(*v),
        SqlParam::TextArray(v) => query.bind(v.clone()),
        SqlParam::FloatArray(v) => query.bind(v.clone()),
        SqlParam::IntArray(v) => query.bind(v.clone()),
        SqlParam::Vector(v) => query.bind(vector_literal(v)),
    }
}

/// Convert a database row to a JSON row mapping.
fn row_to_json(row: &PgRow) -> Result<Row> {
    let mut out = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, idx, column.type_info().name())?;
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

/// Decode a single column into JSON by its Postgres type name.
///
/// NULLs map to `Value::Null`; timestamps are rendered as RFC 3339 strings;
/// types without a mapping (including raw `vector` columns) decode to null.
fn decode_column(row: &PgRow, idx: usize, type_name: &str) -> Result<Value> {
    let value = match type_name {
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
            json_from(row.try_get::<Option<String>, _>(idx).map_err(Error::store)?)
        }
        "UUID" => json_from(
            row.try_get::<Option<uuid::Uuid>, _>(idx)
                .map_err(Error::store)?
                .map(|u| u.to_string()),
        ),
        "FLOAT8" => json_from(row.try_get::<Option<f64>, _>(idx).map_err(Error::store)?),
        "FLOAT4" => json_from(
            row.try_get::<Option<f32>, _>(idx)
                .map_err(Error::store)?
                .map(f64::from),
        ),
        "INT8" => json_from(row.try_get::<Option<i64>, _>(idx).map_err(Error::store)?),
        "INT4" => json_from(
            row.try_get::<Option<i32>, _>(idx)
                .map_err(Error::store)?
                .map(i64::from),
        ),
        "INT2" => json_from(
            row.try_get::<Option<i16>, _>(idx)
                .map_err(Error::store)?
                .map(i64::from),
        ),
        "BOOL" => json_from(row.try_get::<Option<bool>, _>(idx).map_err(Error::store)?),
        "TIMESTAMPTZ" => json_from(
            row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx)
                .map_err(Error::store)?
                .map(|t| t.to_rfc3339()),
        ),
        "TIMESTAMP" => json_from(
            row.try_get::<Option<chrono::NaiveDateTime>, _>(idx)
                .map_err(Error::store)?
                .map(|t| t.and_utc().to_rfc3339()),
        ),
        "DATE" => json_from(
            row.try_get::<Option<chrono::NaiveDate>, _>(idx)
                .map_err(Error::store)?
                .map(|d| d.to_string()),
        ),
        "JSON" | "JSONB" => json_from(row.try_get::<Option<Value>, _>(idx).map_err(Error::store)?),
        other => {
            log::trace!("no JSON mapping for column type {other}; returning null");
            Value::Null
        }
    };
    Ok(value)
}

fn json_from<T: Into<Value>>(value: Option<T>) -> Value {
    value.map(Into::into).unwrap_or(Value::Null)
}

// ============================================================================
// Tests
// ============================================================================
