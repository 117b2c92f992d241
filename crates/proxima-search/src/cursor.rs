//! Opaque pagination cursor codec.
//!
//! A cursor captures the last row returned on the previous page as a
//! `(score, id)` pair, serialized to compact JSON and wrapped in URL-safe
//! base64. Callers treat the string as opaque; only this subsystem
//! interprets it.
//!
//! Decoding is fail-open: any malformed, truncated, or tampered input
//! decodes to `None`, which the executor treats as "no cursor" and restarts
//! from the first page. Decoding never panics and never returns an error.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// Pagination state for one page boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    /// Normalized similarity score of the last returned row.
    #[serde(rename = "s")]
    pub score: f64,

    /// Id of the last returned row; breaks ties on equal distance.
    #[serde(rename = "id")]
    pub id: String,
}

impl Cursor {
    /// Create a cursor from the last row of a page.
    pub fn new(score: f64, id: impl Into<String>) -> Self {
        Self {
            score,
            id: id.into(),
        }
    }

    /// Encode to an opaque string.
    pub fn encode(&self) -> String {
        let body = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(body)
    }

    /// Decode an opaque string.
    ///
    /// Returns `None` for anything that is not a well-formed cursor with a
    /// finite score.
    pub fn decode(raw: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(raw.trim()).ok()?;
        let cursor: Cursor = serde_json::from_slice(&bytes).ok()?;
        if !cursor.score.is_finite() {
            return None;
        }
        Some(cursor)
    }
}

// ============================================================================
// Tests
// ============================================================================
