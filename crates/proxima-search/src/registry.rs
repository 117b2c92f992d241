//! Field configuration registry.
//!
//! An immutable map of vector field name to [`VectorFieldConfig`]. The
//! registry is constructed once at process start from generated configuration
//! and injected into the [`SearchExecutor`](crate::executor::SearchExecutor);
//! it has no write API, so concurrent readers require no locking.

use std::collections::HashMap;

use crate::types::VectorFieldConfig;

/// Immutable registry of vector field configurations.
///
/// Construct with [`FieldRegistry::new`] from deserialized configuration,
/// then share behind `Arc`. Later configs win when two entries share a
/// field name.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: HashMap<String, VectorFieldConfig>,
}

impl FieldRegistry {
    /// Build a registry from field configurations.
    pub fn new(configs: impl IntoIterator<Item = VectorFieldConfig>) -> Self {
        let fields = configs
            .into_iter()
            .map(|config| (config.field_name.clone(), config))
            .collect();
        Self { fields }
    }

    /// Look up the configuration for a field.
    pub fn get(&self, field: &str) -> Option<&VectorFieldConfig> {
        self.fields.get(field)
    }

    /// Whether a field is registered for vector search.
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// All registered field names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
