//! Relationship types - validated pairwise connections between mental models
//!
//! A relationship starts life as a [`RelationshipCandidate`] (in-memory, not
//! yet persisted). The store facade validates and normalizes it, and on
//! acceptance it becomes a [`Relationship`] - a durable record with a
//! confirmed unique identity.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Directionality of a relationship between two models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The relationship holds in both directions
    Bidirectional,
    /// model_a → model_b
    AToB,
    /// model_b → model_a
    BToA,
}

impl Direction {
    /// Get the string representation of the direction
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Bidirectional => "bidirectional",
            Direction::AToB => "a_to_b",
            Direction::BToA => "b_to_a",
        }
    }

    /// Get all directions
    pub fn all() -> &'static [Direction] {
        &[Direction::Bidirectional, Direction::AToB, Direction::BToA]
    }
}

impl FromStr for Direction {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bidirectional" | "both" => Ok(Direction::Bidirectional),
            "a_to_b" | "a->b" => Ok(Direction::AToB),
            "b_to_a" | "b->a" => Ok(Direction::BToA),
            _ => Err(crate::Error::Validation(format!("Unknown direction: {}", s))),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Review state of a relationship record.
///
/// New candidates default to `Pending`. Transitions past initial assignment
/// belong to a separate re-validation workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    /// Get the string representation of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }

    /// Get all statuses
    pub fn all() -> &'static [ReviewStatus] {
        &[
            ReviewStatus::Pending,
            ReviewStatus::Approved,
            ReviewStatus::Rejected,
        ]
    }
}

impl FromStr for ReviewStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ReviewStatus::Pending),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            _ => Err(crate::Error::Validation(format!(
                "Unknown review status: {}",
                s
            ))),
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Optional literature backing for a relationship.
///
/// Kept nested on the candidate; the store flattens it into three scalar
/// columns on write. When `has_support` is false, citation and url are
/// forced to null so orphaned citation data never implies support that was
/// never asserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteratureSupport {
    pub has_support: bool,
    #[serde(default)]
    pub citation: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A relationship candidate - in-memory, not yet accepted by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipCandidate {
    /// Unique identifier, immutable once persisted
    pub id: String,
    /// First endpoint (source when direction is a_to_b)
    pub model_a: String,
    /// Second endpoint (source when direction is b_to_a)
    pub model_b: String,
    /// Category of the connection ("supports", "conflicts", ...); the
    /// concrete set is external configuration, not an enum here
    pub relationship_type: String,
    pub direction: Direction,
    /// Reviewer certainty in [0.0, 1.0]
    pub confidence: f64,
    /// Free-text reasoning behind the relationship
    pub logical_derivation: String,
    #[serde(default)]
    pub empirical_observation: Option<String>,
    #[serde(default)]
    pub literature_support: Option<LiteratureSupport>,
    /// Reviewer identifier
    pub validated_by: String,
    /// RFC 3339 timestamp of the review
    pub validated_at: String,
    /// Defaults to pending when absent
    #[serde(default)]
    pub review_status: Option<ReviewStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl RelationshipCandidate {
    /// Check structural invariants. Called by the store facade before any
    /// write; a failure here means nothing was written.
    pub fn validate(&self) -> crate::Result<()> {
        for (field, value) in [
            ("id", &self.id),
            ("model_a", &self.model_a),
            ("model_b", &self.model_b),
            ("relationship_type", &self.relationship_type),
            ("logical_derivation", &self.logical_derivation),
            ("validated_by", &self.validated_by),
            ("validated_at", &self.validated_at),
        ] {
            if value.trim().is_empty() {
                return Err(crate::Error::Validation(format!(
                    "{}: required field is empty",
                    field
                )));
            }
        }

        if self.model_a == self.model_b {
            return Err(crate::Error::Validation(format!(
                "{}: model_a and model_b must differ ({})",
                self.id, self.model_a
            )));
        }

        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(crate::Error::Validation(format!(
                "{}: confidence {} outside [0.0, 1.0]",
                self.id, self.confidence
            )));
        }

        Ok(())
    }
}

/// A persisted relationship record.
///
/// The literature substructure is flattened here: `has_literature_support`
/// is the asserted flag, and citation/url are null whenever it is false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub model_a: String,
    pub model_b: String,
    pub relationship_type: String,
    pub direction: Direction,
    pub confidence: f64,
    pub logical_derivation: String,
    pub empirical_observation: Option<String>,
    pub has_literature_support: bool,
    pub literature_citation: Option<String>,
    pub literature_url: Option<String>,
    pub validated_by: String,
    pub validated_at: String,
    pub review_status: ReviewStatus,
    pub notes: Option<String>,
}

impl Relationship {
    /// Normalize a validated candidate into the flat persisted shape.
    ///
    /// Does not re-run validation; the facade validates first.
    pub fn from_candidate(candidate: &RelationshipCandidate) -> Self {
        let (has_support, citation, url) = match &candidate.literature_support {
            Some(support) if support.has_support => (
                true,
                support.citation.clone(),
                support.url.clone(),
            ),
            // No asserted support: drop any citation/url that came along
            _ => (false, None, None),
        };

        Self {
            id: candidate.id.clone(),
            model_a: candidate.model_a.clone(),
            model_b: candidate.model_b.clone(),
            relationship_type: candidate.relationship_type.clone(),
            direction: candidate.direction,
            confidence: candidate.confidence,
            logical_derivation: candidate.logical_derivation.clone(),
            empirical_observation: candidate.empirical_observation.clone(),
            has_literature_support: has_support,
            literature_citation: citation,
            literature_url: url,
            validated_by: candidate.validated_by.clone(),
            validated_at: candidate.validated_at.clone(),
            review_status: candidate.review_status.unwrap_or_default(),
            notes: candidate.notes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_candidate(id: &str, a: &str, b: &str) -> RelationshipCandidate {
        RelationshipCandidate {
            id: id.to_string(),
            model_a: a.to_string(),
            model_b: b.to_string(),
            relationship_type: "supports".to_string(),
            direction: Direction::Bidirectional,
            confidence: 0.8,
            logical_derivation: "Both reason from constraints outward.".to_string(),
            empirical_observation: None,
            literature_support: None,
            validated_by: "reviewer-1".to_string(),
            validated_at: "2026-01-10T12:00:00Z".to_string(),
            review_status: None,
            notes: None,
        }
    }

    #[test]
    fn test_direction_roundtrip() {
        for direction in Direction::all() {
            let s = direction.as_str();
            let parsed: Direction = s.parse().unwrap();
            assert_eq!(*direction, parsed);
        }
    }

    #[test]
    fn test_review_status_roundtrip() {
        for status in ReviewStatus::all() {
            let s = status.as_str();
            let parsed: ReviewStatus = s.parse().unwrap();
            assert_eq!(*status, parsed);
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!("superseded".parse::<ReviewStatus>().is_err());
    }

    #[test]
    fn test_valid_candidate_passes() {
        assert!(sample_candidate("r1", "first-principles", "inversion")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_same_endpoints_rejected() {
        let candidate = sample_candidate("r1", "inversion", "inversion");
        assert!(candidate.validate().is_err());
    }

    #[test]
    fn test_confidence_bounds() {
        let mut candidate = sample_candidate("r1", "a", "b");
        candidate.confidence = 1.2;
        assert!(candidate.validate().is_err());
        candidate.confidence = -0.1;
        assert!(candidate.validate().is_err());
        candidate.confidence = 0.0;
        assert!(candidate.validate().is_ok());
        candidate.confidence = 1.0;
        assert!(candidate.validate().is_ok());
    }

    #[test]
    fn test_empty_required_field_rejected() {
        let mut candidate = sample_candidate("r1", "a", "b");
        candidate.logical_derivation = "   ".to_string();
        assert!(candidate.validate().is_err());
    }

    #[test]
    fn test_unsupported_literature_normalized_to_null() {
        let mut candidate = sample_candidate("r1", "a", "b");
        candidate.literature_support = Some(LiteratureSupport {
            has_support: false,
            citation: Some("Kahneman 2011".to_string()),
            url: Some("https://example.org/tfs".to_string()),
        });

        let record = Relationship::from_candidate(&candidate);
        assert!(!record.has_literature_support);
        assert_eq!(record.literature_citation, None);
        assert_eq!(record.literature_url, None);
    }

    #[test]
    fn test_supported_literature_preserved() {
        let mut candidate = sample_candidate("r1", "a", "b");
        candidate.literature_support = Some(LiteratureSupport {
            has_support: true,
            citation: Some("Munger 1994".to_string()),
            url: None,
        });

        let record = Relationship::from_candidate(&candidate);
        assert!(record.has_literature_support);
        assert_eq!(record.literature_citation.as_deref(), Some("Munger 1994"));
        assert_eq!(record.literature_url, None);
    }

    #[test]
    fn test_review_status_defaults_to_pending() {
        let candidate = sample_candidate("r1", "a", "b");
        let record = Relationship::from_candidate(&candidate);
        assert_eq!(record.review_status, ReviewStatus::Pending);
    }

    #[test]
    fn test_candidate_deserializes_from_seed_json() {
        let json = r#"{
            "id": "r1",
            "model_a": "first-principles",
            "model_b": "inversion",
            "relationship_type": "supports",
            "direction": "bidirectional",
            "confidence": 0.85,
            "logical_derivation": "Both strip assumptions before reasoning.",
            "validated_by": "reviewer-1",
            "validated_at": "2026-01-10T12:00:00Z"
        }"#;

        let candidate: RelationshipCandidate = serde_json::from_str(json).unwrap();
        assert_eq!(candidate.id, "r1");
        assert_eq!(candidate.direction, Direction::Bidirectional);
        assert_eq!(candidate.review_status, None);
        assert_eq!(candidate.literature_support, None);
        assert!(candidate.validate().is_ok());
    }
}
