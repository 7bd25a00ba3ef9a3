//! Error types for fetching and aggregating reviews.

use std::path::PathBuf;

/// Failure to obtain a document's reviews from a [`crate::source::ReviewSource`].
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid document id {0:?} (expected lowercase letters, digits and '-')")]
    InvalidDocumentId(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("document not found")]
    NotFound,

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed reviews response: {0}")]
    Decode(String),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A rating record that cannot be aggregated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidRatingError {
    #[error("rating #{index} has no category")]
    MissingCategory { index: usize },

    #[error("rating #{index} ({category}) has no value")]
    MissingValue { index: usize, category: String },

    #[error("rating #{index} ({category}) has a non-numeric value: {value}")]
    NonNumericValue {
        index: usize,
        category: String,
        value: String,
    },

    #[error("rating #{index} uses the reserved category name {category:?}")]
    ReservedCategory { index: usize, category: String },
}

/// Failure to load the reviews view for one document.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("failed to fetch reviews for {document_id}: {source}")]
    FetchFailed {
        document_id: String,
        #[source]
        source: FetchError,
    },
}
