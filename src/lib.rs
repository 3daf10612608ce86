//! # Mindgraph - Mental-model relationship catalog
//!
//! A catalog of mental models and the validated pairwise relationships
//! between them, backed by a SQLite row store.
//!
//! Mindgraph provides:
//! - A relationship record type with a reviewed validation lifecycle
//! - A narrow store facade that normalizes and persists candidates
//! - An idempotent seeding driver with per-record failure isolation
//! - An MCP stdio server exposing the catalog as tools

pub mod catalog;
pub mod config;
pub mod relationship;
pub mod seed;
pub mod server;
pub mod storage;

// Re-exports for convenient access
pub use catalog::{Model, ModelCatalog};
pub use relationship::{Direction, Relationship, RelationshipCandidate, ReviewStatus};
pub use seed::{seed_all, SeedSummary};
pub use storage::SqliteStore;

/// Result type alias for Mindgraph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Mindgraph operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Duplicate relationship id: {0}")]
    DuplicateId(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed data: {0}")]
    SeedFormat(#[from] serde_json::Error),
}

impl Error {
    /// Duplicate-identity failures are the expected outcome when a seed run
    /// is retried; batch callers treat them as non-fatal.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Error::DuplicateId(_))
    }
}
