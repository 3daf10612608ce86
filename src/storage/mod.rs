//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with a single table:
//! - relationships(id, model_a, model_b, relationship_type, direction,
//!   confidence, logical_derivation, empirical_observation,
//!   has_literature_support, literature_citation, literature_url,
//!   validated_by, validated_at, review_status, notes)

pub mod schema;
pub mod sqlite;

pub use sqlite::{DbStats, SqliteStore};
