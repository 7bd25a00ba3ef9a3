//! Rating aggregation and statistics.
//!
//! This module validates raw rating records and folds them into
//! per-category summaries, with an optional "Overall" entry computed
//! from the per-category results.

use crate::error::InvalidRatingError;
use crate::models::{
    Averages, CategorySummary, Rating, RatingRecord, Workflow, CATEGORY_MAX_LENGTH,
    OVERALL_CATEGORY, RATING_MAX, RATING_MIN,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// What to do with a rating record that fails validation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum InvalidRatingPolicy {
    /// Drop the record and keep a diagnostic (default)
    #[default]
    Skip,
    /// Stop aggregating the workflow at the first invalid record
    Abort,
}

/// Options for one aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    pub include_overall: bool,
    pub on_invalid: InvalidRatingPolicy,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            include_overall: true,
            on_invalid: InvalidRatingPolicy::Skip,
        }
    }
}

/// Summarize ratings per category.
///
/// Every distinct category in `ratings` appears exactly once in the result.
/// With `include_overall`, an extra [`OVERALL_CATEGORY`] entry holds the
/// totals of all other entries.
pub fn aggregate(ratings: &[Rating], include_overall: bool) -> Averages {
    let mut averages = Averages::new();

    for rating in ratings {
        let entry = averages.entry(rating.category.clone()).or_default();
        entry.count += 1;
        entry.sum += rating.value;
    }

    if include_overall {
        let overall = overall_summary(&averages);
        averages.insert(OVERALL_CATEGORY.to_string(), overall);
    }

    averages
}

/// Fold the per-category entries into one summary.
///
/// Any existing [`OVERALL_CATEGORY`] entry is ignored.
pub fn overall_summary(averages: &Averages) -> CategorySummary {
    averages
        .iter()
        .filter(|(category, _)| category.as_str() != OVERALL_CATEGORY)
        .fold(CategorySummary::default(), |acc, (_, summary)| {
            CategorySummary {
                count: acc.count + summary.count,
                sum: acc.sum + summary.sum,
            }
        })
}

/// Validate one wire record.
pub fn validate_rating(
    index: usize,
    record: &RatingRecord,
    include_overall: bool,
) -> Result<Rating, InvalidRatingError> {
    let category = match record.category.as_deref().map(str::trim) {
        Some(category) if !category.is_empty() => category.to_string(),
        _ => return Err(InvalidRatingError::MissingCategory { index }),
    };

    if include_overall && category == OVERALL_CATEGORY {
        return Err(InvalidRatingError::ReservedCategory { index, category });
    }

    let value = match &record.value {
        None | Some(Value::Null) => {
            return Err(InvalidRatingError::MissingValue { index, category })
        }
        Some(Value::Number(number)) => match number.as_f64() {
            Some(value) if value.is_finite() => value,
            _ => {
                return Err(InvalidRatingError::NonNumericValue {
                    index,
                    category,
                    value: number.to_string(),
                })
            }
        },
        Some(other) => {
            return Err(InvalidRatingError::NonNumericValue {
                index,
                category,
                value: other.to_string(),
            })
        }
    };

    if category.chars().count() > CATEGORY_MAX_LENGTH {
        warn!(
            "Rating #{} category {:?} is longer than {} characters",
            index, category, CATEGORY_MAX_LENGTH
        );
    }
    if !(RATING_MIN..=RATING_MAX).contains(&value) {
        warn!(
            "Rating #{} ({}) value {} is outside {}..={}",
            index, category, value, RATING_MIN, RATING_MAX
        );
    }

    Ok(Rating::new(category, value))
}

/// Validate a list of records under the given policy.
///
/// Returns the valid ratings and, under [`InvalidRatingPolicy::Skip`], the
/// errors for every record that was dropped.
pub fn validate_ratings(
    records: &[RatingRecord],
    options: &AggregateOptions,
) -> Result<(Vec<Rating>, Vec<InvalidRatingError>), InvalidRatingError> {
    let mut ratings = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();

    for (index, record) in records.iter().enumerate() {
        match validate_rating(index, record, options.include_overall) {
            Ok(rating) => ratings.push(rating),
            Err(e) => match options.on_invalid {
                InvalidRatingPolicy::Abort => return Err(e),
                InvalidRatingPolicy::Skip => {
                    warn!("Skipping invalid rating: {}", e);
                    skipped.push(e);
                }
            },
        }
    }

    Ok((ratings, skipped))
}

/// Recompute a workflow's `averages` from its ratings.
///
/// The previous averages are always discarded, even if validation aborts.
pub fn annotate_workflow(
    workflow: &mut Workflow,
    options: &AggregateOptions,
) -> Result<Vec<InvalidRatingError>, InvalidRatingError> {
    workflow.averages.clear();

    let (ratings, skipped) = validate_ratings(&workflow.ratings, options)?;
    workflow.averages = aggregate(&ratings, options.include_overall);

    debug!(
        "Workflow {:?}: {} ratings in {} categories ({} skipped)",
        workflow.name,
        ratings.len(),
        workflow
            .averages
            .keys()
            .filter(|c| c.as_str() != OVERALL_CATEGORY)
            .count(),
        skipped.len()
    );

    Ok(skipped)
}

/// Categories ordered by average, highest first. "Overall" is excluded.
pub fn ranked_categories(averages: &Averages) -> Vec<(&str, f64)> {
    let mut ranked: Vec<(&str, f64)> = averages
        .iter()
        .filter(|(category, _)| category.as_str() != OVERALL_CATEGORY)
        .filter_map(|(category, summary)| summary.average().map(|avg| (category.as_str(), avg)))
        .collect();

    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    ranked
}

/// Number of ratings behind the per-category entries.
pub fn total_ratings(averages: &Averages) -> usize {
    overall_summary(averages).count
}
