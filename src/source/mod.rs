//! Review sources.
//!
//! A [`ReviewSource`] fetches the reviews of one document. The HTTP source
//! talks to the server's reviews endpoint; the file source reads JSON
//! exported from it.

pub mod file;
pub mod http;

pub use file::FileReviewSource;
pub use http::HttpReviewSource;

use crate::error::FetchError;
use crate::models::DocumentReviews;
use async_trait::async_trait;

/// Something that can fetch the reviews for a document.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Fetch the reviews of `document_id`.
    async fn fetch_reviews(&self, document_id: &str) -> Result<DocumentReviews, FetchError>;

    /// Human-readable location of the source, for logs and report metadata.
    fn describe(&self) -> String;
}

/// Check a document id against the server's `[a-z0-9-]+` route pattern.
pub fn validate_document_id(document_id: &str) -> Result<(), FetchError> {
    let valid = !document_id.is_empty()
        && document_id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    if valid {
        Ok(())
    } else {
        Err(FetchError::InvalidDocumentId(document_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_document_id() {
        assert!(validate_document_id("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2").is_ok());
        assert!(validate_document_id("doc-1").is_ok());

        assert!(validate_document_id("").is_err());
        assert!(validate_document_id("Doc-1").is_err());
        assert!(validate_document_id("../etc/passwd").is_err());
        assert!(validate_document_id("doc 1").is_err());
    }

    #[test]
    fn test_sources_reject_bad_ids_without_io() {
        let source = FileReviewSource::new("/definitely/not/here");
        let err = tokio_test::block_on(source.fetch_reviews("Bad Id")).unwrap_err();
        assert!(matches!(err, FetchError::InvalidDocumentId(_)));
    }
}
