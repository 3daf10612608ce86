//! Mental-model catalog - the named models relationships connect
//!
//! The catalog is static configuration, not store state: a JSON array of
//! models loaded at startup (or the built-in set). Relationship endpoints
//! reference models by id, but the store does not enforce membership here.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Built-in model set shipped with the binary
const BUILTIN_MODELS_JSON: &str = include_str!("../data/models.json");

/// A single mental model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
}

/// An ordered, id-addressable collection of models
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: Vec<Model>,
}

impl ModelCatalog {
    /// Load a catalog from a JSON file (an array of models)
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let models = serde_json::from_str(&contents)?;
        Ok(Self { models })
    }

    /// The built-in model set
    pub fn builtin() -> Result<Self> {
        let models = serde_json::from_str(BUILTIN_MODELS_JSON)?;
        Ok(Self { models })
    }

    /// Look up a model by id
    pub fn get(&self, id: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.id == id)
    }

    /// All models, in catalog order
    pub fn all(&self) -> &[Model] {
        &self.models
    }

    /// Models in a category
    pub fn by_category(&self, category: &str) -> Vec<&Model> {
        self.models
            .iter()
            .filter(|m| m.category == category)
            .collect()
    }

    /// Number of models in the catalog
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// True when the catalog holds no models
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
