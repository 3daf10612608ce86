//! Seeding driver - idempotent batch import of relationship candidates
//!
//! Candidates are submitted to the store facade one at a time, in input
//! order, and every per-record failure is counted rather than aborting the
//! run. Re-running the same list is safe: already-present ids come back as
//! duplicate-identity failures, new ones succeed.

use std::path::Path;

use crate::relationship::RelationshipCandidate;
use crate::storage::SqliteStore;
use crate::Result;

/// Starter candidate list shipped with the binary
const BUILTIN_SEED_JSON: &str = include_str!("../data/seed_relationships.json");

/// One failed candidate from a seeding run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedFailure {
    pub id: String,
    pub reason: String,
}

/// Outcome of one seeding run.
///
/// A run over zero candidates and a run where every candidate failed both
/// end with `success_count == 0`; [`SeedSummary::is_empty_run`] tells them
/// apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub success_count: usize,
    pub error_count: usize,
    /// Failed candidates, in submission order
    pub failures: Vec<SeedFailure>,
}

impl SeedSummary {
    /// Total candidates processed
    pub fn total(&self) -> usize {
        self.success_count + self.error_count
    }

    /// True when no candidates were supplied at all
    pub fn is_empty_run(&self) -> bool {
        self.total() == 0
    }

    /// True when every supplied candidate was persisted
    pub fn is_complete(&self) -> bool {
        !self.is_empty_run() && self.error_count == 0
    }
}

impl std::fmt::Display for SeedSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty_run() {
            return write!(f, "Nothing to seed: no candidates supplied.");
        }
        if self.is_complete() {
            return write!(f, "Seed complete: {} relationships persisted.", self.success_count);
        }
        write!(
            f,
            "Seed finished: {} persisted, {} failed (of {}).",
            self.success_count,
            self.error_count,
            self.total()
        )
    }
}

/// Feed candidates through the store facade sequentially.
///
/// The outcome of candidate *n* is observed before *n+1* is submitted, so
/// log order matches input order. A failure on one candidate never aborts
/// the run.
pub fn seed_all(store: &SqliteStore, candidates: &[RelationshipCandidate]) -> SeedSummary {
    let mut summary = SeedSummary::default();

    for candidate in candidates {
        match store.create_relationship(candidate) {
            Ok(record) => {
                tracing::info!(id = %record.id, "seeded relationship");
                summary.success_count += 1;
            }
            Err(e) => {
                if e.is_duplicate() {
                    tracing::debug!(id = %candidate.id, "already seeded, skipping");
                } else {
                    tracing::warn!(id = %candidate.id, error = %e, "seed candidate failed");
                }
                summary.error_count += 1;
                summary.failures.push(SeedFailure {
                    id: candidate.id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    summary
}

/// Load a candidate list from a JSON file (an array of candidates)
pub fn load_candidates(path: &Path) -> Result<Vec<RelationshipCandidate>> {
    let contents = std::fs::read_to_string(path)?;
    let candidates = serde_json::from_str(&contents)?;
    Ok(candidates)
}

/// The built-in starter candidate list
pub fn builtin_candidates() -> Result<Vec<RelationshipCandidate>> {
    let candidates = serde_json::from_str(BUILTIN_SEED_JSON)?;
    Ok(candidates)
}
