//! Data models for document reviews.
//!
//! This module contains the wire types returned by the reviews endpoint,
//! the validated rating and summary types produced by aggregation, and
//! the report structure handed to the generators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Name of the synthetic entry summarizing every other category.
pub const OVERALL_CATEGORY: &str = "Overall";

/// The max length of a category name.
pub const CATEGORY_MAX_LENGTH: usize = 36;

/// The minimum value for a rating.
pub const RATING_MIN: f64 = 1.0;

/// The maximum value for a rating.
pub const RATING_MAX: f64 = 5.0;

/// Per-category summaries, ordered by category name.
pub type Averages = BTreeMap<String, CategorySummary>;

/// A rating as it arrives on the wire.
///
/// Both fields are optional so that malformed records survive decoding
/// and can be rejected one by one during validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[cfg(test)]
impl RatingRecord {
    /// Builds a well-formed record.
    pub fn new(category: &str, value: f64) -> Self {
        Self {
            category: Some(category.to_string()),
            value: Some(Value::from(value)),
        }
    }
}

/// One validated, scored dimension of a review (e.g. "GPA", "Experience").
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rating {
    pub category: String,
    pub value: f64,
}

impl Rating {
    pub fn new(category: impl Into<String>, value: f64) -> Self {
        Self {
            category: category.into(),
            value,
        }
    }
}

/// Count and sum of the ratings in one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub count: usize,
    pub sum: f64,
}

impl CategorySummary {
    /// Mean value, or `None` for an empty summary.
    pub fn average(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// A comment left on a workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub contents: String,
}

impl<'de> Deserialize<'de> for Comment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // The endpoint has shipped both bare strings and author/contents objects.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Text(String),
            Full {
                #[serde(default)]
                author: Option<String>,
                contents: String,
            },
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Text(contents) => Comment {
                author: None,
                contents,
            },
            Wire::Full { author, contents } => Comment { author, contents },
        })
    }
}

/// A review process instance on a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Route name; empty for the trailing comments-only entry.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ratings: Vec<RatingRecord>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Computed on every aggregation pass, never read from the wire.
    #[serde(skip_deserializing)]
    pub averages: Averages,
}

/// Response of `GET /api/reviews/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentReviews {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub workflows: Vec<Workflow>,
}

/// A document that could not be loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedDocument {
    pub document_id: String,
    pub error: String,
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Where the reviews came from (server URL or input path).
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub documents_loaded: usize,
    pub documents_failed: usize,
    pub include_overall: bool,
}

/// The complete report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub documents: Vec<crate::view::ReviewsView>,
    pub failures: Vec<FailedDocument>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_summary_average() {
        let summary = CategorySummary { count: 3, sum: 10.0 };
        let avg = summary.average().unwrap();
        assert!((avg - 10.0 / 3.0).abs() < 1e-9);

        assert_eq!(CategorySummary::default().average(), None);
    }

    #[test]
    fn test_rating_record_tolerates_missing_fields() {
        let json = r#"[{"category":"GPA","value":3.5},{"value":2},{"category":"GRE","value":"4"},{"category":null}]"#;
        let records: Vec<RatingRecord> = serde_json::from_str(json).unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(records[0], RatingRecord::new("GPA", 3.5));
        assert_eq!(records[1].category, None);
        assert_eq!(records[2].value, Some(Value::String("4".to_string())));
        assert_eq!(records[3].category, None);
        assert_eq!(records[3].value, None);
    }

    #[test]
    fn test_comment_accepts_string_or_object() {
        let json = r#"["Looks good.", {"author":"admin","contents":"Good candidate."}]"#;
        let comments: Vec<Comment> = serde_json::from_str(json).unwrap();

        assert_eq!(comments[0].author, None);
        assert_eq!(comments[0].contents, "Looks good.");
        assert_eq!(comments[1].author.as_deref(), Some("admin"));
        assert_eq!(comments[1].contents, "Good candidate.");
    }

    #[test]
    fn test_workflow_averages_are_not_read_from_wire() {
        let json = r#"{
            "name": "Single review workflow",
            "ratings": [{"category":"GRE","value":4}],
            "averages": {"GRE": {"count": 99, "sum": 99}}
        }"#;
        let workflow: Workflow = serde_json::from_str(json).unwrap();

        assert_eq!(workflow.name, "Single review workflow");
        assert_eq!(workflow.ratings.len(), 1);
        assert!(workflow.averages.is_empty());
    }

    #[test]
    fn test_document_reviews_parses_server_response() {
        let json = r#"{
            "id": "doc-1",
            "title": "Jane Doe",
            "description": null,
            "workflows": [
                {"name": "Two reviews workflow", "ratings": [{"category":"GPA","value":2}]},
                {"comments": ["This is horrible!"]}
            ]
        }"#;
        let reviews: DocumentReviews = serde_json::from_str(json).unwrap();

        assert_eq!(reviews.id, "doc-1");
        assert_eq!(reviews.title, "Jane Doe");
        assert_eq!(reviews.description, None);
        assert_eq!(reviews.workflows.len(), 2);
        assert_eq!(reviews.workflows[1].name, "");
        assert_eq!(reviews.workflows[1].comments.len(), 1);
    }
}
