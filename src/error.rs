//! Domain error types.
//!
//! One thiserror enum per concern: remote API calls, backing-store
//! operations, and join/projection integrity. Transport-level errors
//! (`HttpError`) live in `crate::traits::http` next to the trait.

use thiserror::Error;

use crate::traits::HttpError;

/// Errors from the remote posts API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The HTTP request itself failed.
    #[error(transparent)]
    Http(#[from] HttpError),
    /// The server answered with a non-success status.
    #[error("API returned status {status}: {message}")]
    Status { status: u16, message: String },
    /// The response body was not the expected JSON shape.
    #[error("failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors from the backing post store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The referenced post does not exist in the store.
    #[error("post {0} not found")]
    PostNotFound(i64),
    /// The store's lock was poisoned by a panicking writer.
    #[error("post store lock poisoned")]
    Poisoned,
}

/// Join-integrity errors raised by the projection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    /// A post references an author id absent from the authors snapshot.
    #[error("post {post_id} references missing author {user_id}")]
    AuthorMissing { post_id: i64, user_id: i64 },
}
