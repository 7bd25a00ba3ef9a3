//! Local JSON review source.
//!
//! Reads responses previously saved from the reviews endpoint. The path is
//! either a single JSON file or a directory of `{document_id}.json` files.

use super::{validate_document_id, ReviewSource};
use crate::error::FetchError;
use crate::models::DocumentReviews;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, warn};

pub struct FileReviewSource {
    path: PathBuf,
}

impl FileReviewSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn document_path(&self, document_id: &str) -> PathBuf {
        let is_dir = tokio::fs::metadata(&self.path)
            .await
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false);

        if is_dir {
            self.path.join(format!("{}.json", document_id))
        } else {
            self.path.clone()
        }
    }
}

#[async_trait]
impl ReviewSource for FileReviewSource {
    async fn fetch_reviews(&self, document_id: &str) -> Result<DocumentReviews, FetchError> {
        validate_document_id(document_id)?;

        let path = self.document_path(document_id).await;
        debug!("Reading reviews from {}", path.display());

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| FetchError::Io {
                path: path.clone(),
                source,
            })?;

        let mut reviews: DocumentReviews = serde_json::from_str(&content)
            .map_err(|e| FetchError::Decode(format!("{}: {}", path.display(), e)))?;

        // The report is keyed by the id that was asked for.
        if !reviews.id.is_empty() && reviews.id != document_id {
            warn!(
                "{} holds reviews for {}, reporting them as {}",
                path.display(),
                reviews.id,
                document_id
            );
        }
        reviews.id = document_id.to_string();

        Ok(reviews)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
