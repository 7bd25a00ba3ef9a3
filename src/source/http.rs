//! HTTP review source.

use super::{validate_document_id, ReviewSource};
use crate::error::FetchError;
use crate::models::DocumentReviews;
use async_trait::async_trait;
use reqwest::header::COOKIE;
use std::time::Duration;
use tracing::{debug, info};

/// Name of the cookie carrying the session token.
pub const AUTH_COOKIE_NAME: &str = "auth_token";

/// Fetches reviews from `GET {server}/api/reviews/{id}`.
pub struct HttpReviewSource {
    server_url: String,
    auth_token: Option<String>,
    timeout_seconds: u64,
    http_client: reqwest::Client,
}

impl HttpReviewSource {
    /// Create a source for the given server.
    pub fn new(
        server_url: &str,
        auth_token: Option<String>,
        timeout_seconds: u64,
    ) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| FetchError::Transport(format!("cannot create HTTP client: {}", e)))?;

        info!("Using reviews server at {}", server_url);

        Ok(Self::with_client(
            server_url,
            auth_token,
            timeout_seconds,
            http_client,
        ))
    }

    /// Create a source around an existing client.
    pub fn with_client(
        server_url: &str,
        auth_token: Option<String>,
        timeout_seconds: u64,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            auth_token,
            timeout_seconds,
            http_client,
        }
    }

    fn reviews_url(&self, document_id: &str) -> String {
        format!("{}/api/reviews/{}", self.server_url, document_id)
    }
}

#[async_trait]
impl ReviewSource for HttpReviewSource {
    async fn fetch_reviews(&self, document_id: &str) -> Result<DocumentReviews, FetchError> {
        validate_document_id(document_id)?;

        let url = self.reviews_url(document_id);
        debug!("GET {}", url);

        let mut request = self.http_client.get(&url);
        if let Some(ref token) = self.auth_token {
            request = request.header(COOKIE, format!("{}={}", AUTH_COOKIE_NAME, token));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Transport(format!(
                    "request timed out after {}s",
                    self.timeout_seconds
                ))
            } else if e.is_connect() {
                FetchError::Transport(format!("cannot connect to {}", self.server_url))
            } else {
                FetchError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<DocumentReviews>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }

    fn describe(&self) -> String {
        self.server_url.clone()
    }
}
