//! Remote posts API client.
//!
//! This module provides the HTTP client for the JSONPlaceholder-style
//! backend: paged post reads plus the two bulk aggregate fetches
//! (authors, comments). All requests go through the [`HttpClient`]
//! trait so tests can substitute a mock transport.

use std::sync::Arc;

use tracing::debug;

use crate::error::ApiError;
use crate::models::{Author, Comment, Post};
use crate::paging::Page;
use crate::traits::{Headers, HttpClient};

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Client for the remote posts API.
///
/// Holds a base URL and a shared transport. Cloning is cheap; clones
/// share the underlying HTTP client.
#[derive(Clone)]
pub struct PostsApiClient {
    /// Base URL for the API
    pub base_url: String,
    /// Transport used for all requests
    http: Arc<dyn HttpClient>,
}

impl PostsApiClient {
    /// Create a new client with the default base URL.
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
        }
    }

    /// Create a new client with a custom base URL.
    pub fn with_base_url(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    /// Fetch one page of posts.
    ///
    /// Sends `GET /posts?_start={offset}&_limit={limit}` and computes the
    /// next-page cursor: a page shorter than `limit` is the last one.
    ///
    /// # Arguments
    /// * `offset` - Zero-based index of the first post in the page
    /// * `limit` - Maximum number of posts in the page
    pub async fn fetch_posts_page(&self, offset: u64, limit: u64) -> Result<Page, ApiError> {
        let url = format!(
            "{}/posts?_start={}&_limit={}",
            self.base_url, offset, limit
        );
        debug!(offset, limit, "fetching posts page");

        let posts: Vec<Post> = self.get_json(&url).await?;

        let next_offset = if (posts.len() as u64) < limit {
            None
        } else {
            Some(offset + posts.len() as u64)
        };

        Ok(Page { posts, next_offset })
    }

    /// Fetch the complete author collection (`GET /users`).
    ///
    /// No pagination; the dataset is bounded. No ordering guarantee.
    pub async fn fetch_authors(&self) -> Result<Vec<Author>, ApiError> {
        let url = format!("{}/users", self.base_url);
        debug!("fetching authors");
        self.get_json(&url).await
    }

    /// Fetch the complete comment collection (`GET /comments`).
    ///
    /// No pagination; the dataset is bounded. No ordering guarantee.
    pub async fn fetch_comments(&self) -> Result<Vec<Comment>, ApiError> {
        let url = format!("{}/comments", self.base_url);
        debug!("fetching comments");
        self.get_json(&url).await
    }

    /// GET a URL and decode the JSON body, mapping non-success statuses
    /// to [`ApiError::Status`].
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let mut headers = Headers::new();
        headers.insert("Accept".to_string(), "application/json".to_string());

        let response = self.http.get(url, &headers).await?;

        if !response.is_success() {
            let message = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::Status {
                status: response.status,
                message,
            });
        }

        Ok(response.json()?)
    }
}

impl std::fmt::Debug for PostsApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostsApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
