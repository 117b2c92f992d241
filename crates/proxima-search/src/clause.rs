//! Parameterized SQL clause construction.
//!
//! Builds the WHERE, SELECT, and ORDER BY fragments for a similarity search
//! as typed fragments plus a positional parameter list. Two rules are
//! enforced structurally rather than by convention:
//!
//! - every bound value is a [`SqlParam`]; caller data never reaches the SQL
//!   text itself
//! - every identifier spliced into a fragment passes through
//!   [`proxima_core::naming::column_name`]
//!
//! Placeholder indices come from [`PredicateList::bind`], which appends a
//! parameter and returns its `$n` index, so builder and executor cannot
//! disagree on parameter order. The query vector is always bound first
//! (`$1`); it is carried as [`SqlParam::Vector`] and rendered to the store's
//! native literal only at the store boundary, with a `::vector` cast at each
//! use site.
//!
//! Rows are globally ordered by `(distance ASC, id ASC)`, where distance is
//! the metric's native raw distance regardless of which metric is
//! configured. The keyset predicate reproduces exactly the rows strictly
//! after the cursor row in that total order:
//! `(dist > $d OR (dist = $d AND id > $i))`.

use serde_json::Value;
use std::collections::BTreeMap;

use proxima_core::{Error, Result, column_name};

use crate::convert::score_to_distance;
use crate::cursor::Cursor;
use crate::types::{DISTANCE_COLUMN, SearchOptions, VectorFieldConfig};

/// Default columns selected when the request does not name any.
pub const DEFAULT_COLUMNS: [&str; 3] = ["id", "created_at", "updated_at"];

// ============================================================================
// Typed parameters
// ============================================================================

/// A positionally bound SQL parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// Text value.
    Text(String),
    /// Double-precision float.
    Float(f64),
    /// 64-bit integer.
    Int(i64),
    /// Boolean.
    Bool(bool),
    /// Text array, for `= ANY($n)` membership.
    TextArray(Vec<String>),
    /// Float array, for `= ANY($n)` membership.
    FloatArray(Vec<f64>),
    /// Integer array, for `= ANY($n)` membership.
    IntArray(Vec<i64>),
    /// Query vector; rendered as the store's vector literal at bind time.
    Vector(Vec<f32>),
}

impl SqlParam {
    /// Convert a JSON filter value to a typed parameter.
    ///
    /// Scalars map directly; homogeneous arrays map to the matching array
    /// variant (integer arrays fall back to floats when mixed with
    /// fractional numbers). Nulls are handled by the caller as `IS NULL`
    /// and are rejected here, as are nested objects and heterogeneous
    /// arrays.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(SqlParam::Text(s.clone())),
            Value::Bool(b) => Ok(SqlParam::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(SqlParam::Int(i)),
                None => n
                    .as_f64()
                    .map(SqlParam::Float)
                    .ok_or_else(|| Error::invalid_data(format!("unbindable number: {n}"))),
            },
            Value::Array(items) => Self::from_json_array(items),
            Value::Null => Err(Error::invalid_data(
                "null filter values are expressed as IS NULL, not bound",
            )),
            Value::Object(_) => Err(Error::invalid_data(
                "object filter values cannot be bound",
            )),
        }
    }

    fn from_json_array(items: &[Value]) -> Result<Self> {
        if items.is_empty() {
            // Matches nothing; an empty ANY() array is valid SQL
            return Ok(SqlParam::TextArray(Vec::new()));
        }

        if items.iter().all(Value::is_string) {
            let texts = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
            return Ok(SqlParam::TextArray(texts));
        }

        if items.iter().all(Value::is_number) {
            if items.iter().all(|v| v.as_i64().is_some()) {
                let ints = items.iter().filter_map(Value::as_i64).collect();
                return Ok(SqlParam::IntArray(ints));
            }
            let floats: Option<Vec<f64>> = items.iter().map(Value::as_f64).collect();
            return floats
                .map(SqlParam::FloatArray)
                .ok_or_else(|| Error::invalid_data("unbindable number in array filter"));
        }

        Err(Error::invalid_data(
            "array filters must be all strings or all numbers",
        ))
    }
}

/// Render a vector as the store's native literal, e.g. `[0.1,0.2,0.3]`.
pub fn vector_literal(vector: &[f32]) -> String {
    let mut out = String::with_capacity(vector.len() * 8 + 2);
    out.push('[');
    for (i, v) in vector.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&v.to_string());
    }
    out.push(']');
    out
}

// ============================================================================
// Predicate accumulator
// ============================================================================

/// Accumulates WHERE fragments and their bound parameters.
///
/// Fragments reference parameters by the `$n` index returned from
/// [`bind`](Self::bind); there is no shared counter outside this struct.
#[derive(Debug, Default)]
pub struct PredicateList {
    fragments: Vec<String>,
    params: Vec<SqlParam>,
}

impl PredicateList {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a parameter, returning its 1-based placeholder index.
    pub fn bind(&mut self, param: SqlParam) -> usize {
        self.params.push(param);
        self.params.len()
    }

    /// Append a predicate fragment.
    pub fn push(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
    }

    /// The accumulated parameters, in bind order.
    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    /// Consume the accumulator, yielding the parameters.
    pub fn into_params(self) -> Vec<SqlParam> {
        self.params
    }

    /// Number of predicate fragments.
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Render the WHERE clause, or an empty string with no fragments.
    pub fn where_sql(&self) -> String {
        if self.fragments.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.fragments.join(" AND "))
        }
    }
}

// ============================================================================
// Clause builder
// ============================================================================

/// Builds the SQL clauses for one search against one vector field.
pub struct ClauseBuilder<'a> {
    config: &'a VectorFieldConfig,
    options: &'a SearchOptions,
}

impl<'a> ClauseBuilder<'a> {
    /// Create a builder for a field configuration and executor options.
    pub fn new(config: &'a VectorFieldConfig, options: &'a SearchOptions) -> Self {
        Self { config, options }
    }

    /// The vector column name, derived from the field name.
    pub fn vector_column(&self) -> String {
        column_name(&self.config.field_name)
    }

    /// The raw distance expression between the vector column and `$1`.
    pub fn distance_expr(&self) -> String {
        format!(
            "{} {} $1::vector",
            self.vector_column(),
            self.config.metric.operator()
        )
    }

    /// Build the WHERE clause and parameter list.
    ///
    /// Binds the query vector as `$1`, then composes, in order: the
    /// soft-delete guard, pre-filters, the threshold bound, and the keyset
    /// predicate. A cursor whose score converts to a non-finite distance is
    /// ignored (treated as no cursor), as is a threshold of zero or less.
    pub fn build_where(
        &self,
        vector: &[f32],
        filter: &BTreeMap<String, Value>,
        threshold: Option<f64>,
        cursor: Option<&Cursor>,
    ) -> Result<PredicateList> {
        let mut predicates = PredicateList::new();
        predicates.bind(SqlParam::Vector(vector.to_vec()));

        // Soft-delete guard comes first, unconditionally
        predicates.push(format!("{} IS NULL", self.options.soft_delete_column));

        for (field, value) in filter {
            let column = column_name(field);
            match value {
                Value::Null => predicates.push(format!("{column} IS NULL")),
                Value::Array(_) => {
                    let idx = predicates.bind(SqlParam::from_json(value)?);
                    predicates.push(format!("{column} = ANY(${idx})"));
                }
                _ => {
                    let idx = predicates.bind(SqlParam::from_json(value)?);
                    predicates.push(format!("{column} = ${idx}"));
                }
            }
        }

        if let Some(threshold) = threshold.filter(|t| *t > 0.0) {
            let bound = score_to_distance(threshold, self.config.metric);
            if bound.is_finite() {
                let idx = predicates.bind(SqlParam::Float(bound));
                predicates.push(format!("{} < ${idx}", self.distance_expr()));
            }
        }

        if let Some(cursor) = cursor {
            let distance = score_to_distance(cursor.score, self.config.metric);
            if distance.is_finite() {
                let dist_idx = predicates.bind(SqlParam::Float(distance));
                let id_idx = predicates.bind(SqlParam::Text(cursor.id.clone()));
                let expr = self.distance_expr();
                predicates.push(format!(
                    "({expr} > ${dist_idx} OR ({expr} = ${dist_idx} AND {} > ${id_idx}))",
                    self.options.id_column
                ));
            }
        }

        Ok(predicates)
    }

    /// Build the SELECT clause.
    ///
    /// Uses the default columns unless the request names its own; every
    /// column passes through the naming transform. The distance expression
    /// is appended under [`DISTANCE_COLUMN`] unless suppressed.
    pub fn select_sql(&self, columns: Option<&[String]>, with_distance: bool) -> String {
        let mut cols: Vec<String> = match columns {
            Some(requested) if !requested.is_empty() => {
                requested.iter().map(|c| column_name(c)).collect()
            }
            _ => DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        };

        if with_distance {
            cols.push(format!("{} AS {}", self.distance_expr(), DISTANCE_COLUMN));
        }

        format!("SELECT {}", cols.join(", "))
    }

    /// Build the ORDER BY clause: raw distance ascending, id ascending.
    pub fn order_by_sql(&self) -> String {
        format!(
            "ORDER BY {} ASC, {} ASC",
            self.distance_expr(),
            self.options.id_column
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
