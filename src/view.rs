//! Reviews view-model.
//!
//! A [`ReviewsView`] is what the report renders for one document: the
//! fetched workflows, each annotated with its per-category averages.

use crate::analysis::{annotate_workflow, AggregateOptions};
use crate::error::{InvalidRatingError, ReviewError};
use crate::models::{DocumentReviews, Workflow};
use crate::source::ReviewSource;
use serde::Serialize;
use tracing::{debug, info, warn};

/// A rating record dropped during aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRating {
    pub workflow: String,
    pub reason: String,
}

/// A workflow whose aggregation stopped at an invalid rating.
///
/// Its `averages` stay empty; the other workflows are unaffected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbortedWorkflow {
    /// Position of the workflow in [`ReviewsView::workflows`].
    pub index: usize,
    pub workflow: String,
    pub reason: String,
}

/// Display state for one document's reviews.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewsView {
    pub document_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub workflows: Vec<Workflow>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRating>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aborted: Vec<AbortedWorkflow>,
}

impl ReviewsView {
    /// Build a view from a fetched response, annotating every workflow.
    ///
    /// Under [`InvalidRatingPolicy::Abort`](crate::analysis::InvalidRatingPolicy)
    /// a bad rating only stops its own workflow.
    pub fn from_reviews(reviews: DocumentReviews, options: &AggregateOptions) -> Self {
        let DocumentReviews {
            id,
            title,
            description,
            mut workflows,
        } = reviews;

        let mut skipped = Vec::new();
        let mut aborted = Vec::new();
        for (index, workflow) in workflows.iter_mut().enumerate() {
            match annotate_workflow(workflow, options) {
                Ok(dropped) => {
                    skipped.extend(dropped.into_iter().map(|e: InvalidRatingError| {
                        SkippedRating {
                            workflow: workflow.name.clone(),
                            reason: e.to_string(),
                        }
                    }));
                }
                Err(e) => {
                    warn!("Aggregation aborted for workflow {:?}: {}", workflow.name, e);
                    aborted.push(AbortedWorkflow {
                        index,
                        workflow: workflow.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Self {
            document_id: id,
            title,
            description: description.filter(|d| !d.is_empty()),
            workflows,
            skipped,
            aborted,
        }
    }

    /// The abort record for the workflow at `index`, if aggregation stopped there.
    pub fn aborted_at(&self, index: usize) -> Option<&AbortedWorkflow> {
        self.aborted.iter().find(|a| a.index == index)
    }

    /// Workflows that carry ratings.
    pub fn rated_workflows(&self) -> impl Iterator<Item = &Workflow> {
        self.workflows.iter().filter(|w| !w.ratings.is_empty())
    }
}

/// Fetch a document's reviews and build its view.
///
/// Aggregation only runs once the fetch has succeeded.
pub async fn load_document_reviews(
    source: &dyn ReviewSource,
    document_id: &str,
    options: &AggregateOptions,
) -> Result<ReviewsView, ReviewError> {
    debug!("Fetching reviews for {} from {}", document_id, source.describe());

    let reviews = source
        .fetch_reviews(document_id)
        .await
        .map_err(|source| ReviewError::FetchFailed {
            document_id: document_id.to_string(),
            source,
        })?;

    let view = ReviewsView::from_reviews(reviews, options);
    info!(
        "Loaded {} workflows for {} ({} ratings skipped)",
        view.workflows.len(),
        document_id,
        view.skipped.len()
    );

    Ok(view)
}
