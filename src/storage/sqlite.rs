//! SQLite storage implementation
//!
//! [`SqliteStore::create_relationship`] is the single write entry point for
//! relationship candidates. It validates and normalizes before the store is
//! touched, so no failure path leaves a partial row behind, and it converts
//! every underlying fault into a failure [`crate::Result`] instead of
//! letting it escape the facade.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use super::schema;
use crate::relationship::{Relationship, RelationshipCandidate, ReviewStatus};
use crate::{Error, Result};

/// SQLite-backed store for the relationship catalog
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== Write Facade ==========

    /// Validate, normalize, and persist a relationship candidate.
    ///
    /// Exactly one durable write on success; no write on any failure path.
    /// A same-id race between concurrent callers is settled by the primary
    /// key constraint - the loser gets [`Error::DuplicateId`], which batch
    /// callers treat as non-fatal.
    pub fn create_relationship(
        &self,
        candidate: &RelationshipCandidate,
    ) -> Result<Relationship> {
        candidate.validate()?;
        let record = Relationship::from_candidate(candidate);

        let inserted = self.conn.execute(
            r#"
            INSERT INTO relationships (
                id, model_a, model_b, relationship_type, direction, confidence,
                logical_derivation, empirical_observation,
                has_literature_support, literature_citation, literature_url,
                validated_by, validated_at, review_status, notes
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                record.id,
                record.model_a,
                record.model_b,
                record.relationship_type,
                record.direction.as_str(),
                record.confidence,
                record.logical_derivation,
                record.empirical_observation,
                record.has_literature_support as i64,
                record.literature_citation,
                record.literature_url,
                record.validated_by,
                record.validated_at,
                record.review_status.as_str(),
                record.notes,
            ],
        );

        match inserted {
            Ok(_) => Ok(record),
            Err(e) if is_unique_violation(&e) => Err(Error::DuplicateId(record.id)),
            Err(e) => Err(e.into()),
        }
    }

    // ========== Read Operations ==========

    /// Get a relationship by id
    pub fn get_relationship(&self, id: &str) -> Result<Option<Relationship>> {
        self.conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_RELATIONSHIP),
                [id],
                row_to_relationship,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all relationships, ordered by id
    pub fn list_relationships(&self) -> Result<Vec<Relationship>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY id", SELECT_RELATIONSHIP))?;

        let relationships = stmt
            .query_map([], row_to_relationship)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(relationships)
    }

    /// Find relationships touching a model (either endpoint)
    pub fn find_for_model(&self, model: &str) -> Result<Vec<Relationship>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE model_a = ?1 OR model_b = ?1 ORDER BY id",
            SELECT_RELATIONSHIP
        ))?;

        let relationships = stmt
            .query_map([model], row_to_relationship)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(relationships)
    }

    /// Find relationships by review status
    pub fn find_by_status(&self, status: ReviewStatus) -> Result<Vec<Relationship>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE review_status = ?1 ORDER BY id",
            SELECT_RELATIONSHIP
        ))?;

        let relationships = stmt
            .query_map([status.as_str()], row_to_relationship)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(relationships)
    }

    /// Count all relationships
    pub fn count_relationships(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM relationships", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn count_by_status(&self, status: ReviewStatus) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM relationships WHERE review_status = ?1",
            [status.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            relationships: self.count_relationships()?,
            pending: self.count_by_status(ReviewStatus::Pending)?,
            approved: self.count_by_status(ReviewStatus::Approved)?,
            rejected: self.count_by_status(ReviewStatus::Rejected)?,
        })
    }
}

const SELECT_RELATIONSHIP: &str = "SELECT id, model_a, model_b, relationship_type, direction, \
     confidence, logical_derivation, empirical_observation, has_literature_support, \
     literature_citation, literature_url, validated_by, validated_at, review_status, notes \
     FROM relationships";

/// Helper to convert a row to a Relationship
fn row_to_relationship(row: &rusqlite::Row) -> rusqlite::Result<Relationship> {
    let direction_str: String = row.get(4)?;
    let status_str: String = row.get(13)?;

    let direction = direction_str.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let review_status = status_str.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(13, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let has_support: i64 = row.get(8)?;

    Ok(Relationship {
        id: row.get(0)?,
        model_a: row.get(1)?,
        model_b: row.get(2)?,
        relationship_type: row.get(3)?,
        direction,
        confidence: row.get(5)?,
        logical_derivation: row.get(6)?,
        empirical_observation: row.get(7)?,
        has_literature_support: has_support != 0,
        literature_citation: row.get(9)?,
        literature_url: row.get(10)?,
        validated_by: row.get(11)?,
        validated_at: row.get(12)?,
        review_status,
        notes: row.get(14)?,
    })
}

/// True when the error is SQLite rejecting a duplicate primary key
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
                && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
    )
}

/// Database statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbStats {
    pub relationships: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "   Relationships: {}", self.relationships)?;
        writeln!(f, "   Pending:       {}", self.pending)?;
        writeln!(f, "   Approved:      {}", self.approved)?;
        write!(f, "   Rejected:      {}", self.rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationship::{Direction, LiteratureSupport};

    fn candidate(id: &str, a: &str, b: &str) -> RelationshipCandidate {
        RelationshipCandidate {
            id: id.to_string(),
            model_a: a.to_string(),
            model_b: b.to_string(),
            relationship_type: "supports".to_string(),
            direction: Direction::AToB,
            confidence: 0.75,
            logical_derivation: "A sharpens the framing B relies on.".to_string(),
            empirical_observation: None,
            literature_support: None,
            validated_by: "reviewer-1".to_string(),
            validated_at: "2026-01-10T12:00:00Z".to_string(),
            review_status: None,
            notes: None,
        }
    }

    #[test]
    fn test_create_and_get_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let created = store
            .create_relationship(&candidate("r1", "first-principles", "inversion"))
            .unwrap();
        assert_eq!(created.id, "r1");
        assert_eq!(created.review_status, ReviewStatus::Pending);

        let fetched = store.get_relationship("r1").unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.model_a, "first-principles");
        assert_eq!(fetched.model_b, "inversion");
        assert_eq!(fetched.direction, Direction::AToB);
        assert_eq!(fetched.confidence, 0.75);
        assert!(!fetched.has_literature_support);
    }

    #[test]
    fn test_get_missing_returns_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.get_relationship("nope").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_id_rejected_and_original_unchanged() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .create_relationship(&candidate("r1", "first-principles", "inversion"))
            .unwrap();

        let result = store.create_relationship(&candidate("r1", "occams-razor", "hanlons-razor"));
        match result {
            Err(Error::DuplicateId(id)) => assert_eq!(id, "r1"),
            other => panic!("expected DuplicateId, got {:?}", other.map(|r| r.id)),
        }

        // Loser of the race must not clobber the existing row
        let existing = store.get_relationship("r1").unwrap().unwrap();
        assert_eq!(existing.model_a, "first-principles");
        assert_eq!(store.count_relationships().unwrap(), 1);
    }

    #[test]
    fn test_same_endpoints_rejected_without_write() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result = store.create_relationship(&candidate("r1", "inversion", "inversion"));
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(store.count_relationships().unwrap(), 0);
    }

    #[test]
    fn test_out_of_range_confidence_rejected_without_write() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut c = candidate("r1", "a", "b");
        c.confidence = 1.5;
        assert!(matches!(
            store.create_relationship(&c),
            Err(Error::Validation(_))
        ));
        assert_eq!(store.count_relationships().unwrap(), 0);
    }

    #[test]
    fn test_unsupported_citation_normalized_on_write() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut c = candidate("r1", "a", "b");
        c.literature_support = Some(LiteratureSupport {
            has_support: false,
            citation: Some("orphaned citation".to_string()),
            url: Some("https://example.org".to_string()),
        });

        let created = store.create_relationship(&c).unwrap();
        assert!(!created.has_literature_support);
        assert_eq!(created.literature_citation, None);

        let persisted = store.get_relationship("r1").unwrap().unwrap();
        assert!(!persisted.has_literature_support);
        assert_eq!(persisted.literature_citation, None);
        assert_eq!(persisted.literature_url, None);
    }

    #[test]
    fn test_supported_citation_persisted() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut c = candidate("r1", "a", "b");
        c.literature_support = Some(LiteratureSupport {
            has_support: true,
            citation: Some("Munger, Poor Charlie's Almanack".to_string()),
            url: None,
        });

        let persisted = store.create_relationship(&c).unwrap();
        assert!(persisted.has_literature_support);
        assert_eq!(
            persisted.literature_citation.as_deref(),
            Some("Munger, Poor Charlie's Almanack")
        );
    }

    #[test]
    fn test_explicit_review_status_persisted() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut c = candidate("r1", "a", "b");
        c.review_status = Some(ReviewStatus::Approved);

        store.create_relationship(&c).unwrap();
        let persisted = store.get_relationship("r1").unwrap().unwrap();
        assert_eq!(persisted.review_status, ReviewStatus::Approved);
    }

    #[test]
    fn test_find_for_model_matches_either_endpoint() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .create_relationship(&candidate("r1", "inversion", "first-principles"))
            .unwrap();
        store
            .create_relationship(&candidate("r2", "second-order-thinking", "inversion"))
            .unwrap();
        store
            .create_relationship(&candidate("r3", "occams-razor", "hanlons-razor"))
            .unwrap();

        let hits = store.find_for_model("inversion").unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "r1");
        assert_eq!(hits[1].id, "r2");
    }

    #[test]
    fn test_find_by_status() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut approved = candidate("r1", "a", "b");
        approved.review_status = Some(ReviewStatus::Approved);
        store.create_relationship(&approved).unwrap();
        store.create_relationship(&candidate("r2", "a", "c")).unwrap();

        let pending = store.find_by_status(ReviewStatus::Pending).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "r2");
    }

    #[test]
    fn test_stats() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut approved = candidate("r1", "a", "b");
        approved.review_status = Some(ReviewStatus::Approved);
        store.create_relationship(&approved).unwrap();
        store.create_relationship(&candidate("r2", "a", "c")).unwrap();
        store.create_relationship(&candidate("r3", "b", "c")).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.relationships, 3);
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.rejected, 0);
    }

    #[test]
    fn test_durable_write_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mindgraph.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .create_relationship(&candidate("r1", "map-territory", "circle-of-competence"))
                .unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        let persisted = reopened.get_relationship("r1").unwrap().unwrap();
        assert_eq!(persisted.model_a, "map-territory");
    }
}
