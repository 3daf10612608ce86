//! Database schema definitions

/// SQL to create the relationships table
///
/// One row per persisted relationship, in the flat normalized shape: the
/// literature substructure is three scalar columns, and the id primary key
/// is the sole uniqueness guarantee for concurrent same-id writes.
pub const CREATE_RELATIONSHIPS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS relationships (
    id TEXT PRIMARY KEY,
    model_a TEXT NOT NULL,
    model_b TEXT NOT NULL,
    relationship_type TEXT NOT NULL,
    direction TEXT NOT NULL,
    confidence REAL NOT NULL,
    logical_derivation TEXT NOT NULL,
    empirical_observation TEXT,
    has_literature_support INTEGER NOT NULL DEFAULT 0,
    literature_citation TEXT,
    literature_url TEXT,
    validated_by TEXT NOT NULL,
    validated_at TEXT NOT NULL,
    review_status TEXT NOT NULL DEFAULT 'pending',
    notes TEXT,
    CHECK (model_a <> model_b)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_relationships_model_a ON relationships(model_a)",
    "CREATE INDEX IF NOT EXISTS idx_relationships_model_b ON relationships(model_b)",
    "CREATE INDEX IF NOT EXISTS idx_relationships_type ON relationships(relationship_type)",
    "CREATE INDEX IF NOT EXISTS idx_relationships_status ON relationships(review_status)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_RELATIONSHIPS_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
