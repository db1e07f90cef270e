//! Transport seam for the remote posts backend.
//!
//! Every network call in the crate goes through the [`HttpClient`]
//! trait, so the whole pipeline can run against a scripted mock
//! transport in tests and against reqwest in production. Only GET is
//! modeled; the backend is read-only from this client's point of view
//! and all mutations are local.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;

/// Request and response headers, keyed by header name.
pub type Headers = HashMap<String, String>;

/// A completed HTTP exchange, status and body included.
///
/// Non-success statuses are carried here rather than raised as errors;
/// classifying them is the API client's job, not the transport's.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Raw response body
    pub body: Bytes,
}

impl Response {
    /// A response with a status and body and no headers.
    pub fn new(status: u16, body: Bytes) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body,
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body decoded as UTF-8 text.
    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }

    /// The body decoded as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Failures raised by the transport itself.
///
/// A reachable server answering with an error status is NOT one of
/// these; that case comes back as a normal [`Response`].
#[derive(Debug, Clone)]
pub enum HttpError {
    /// The connection could not be established
    ConnectionFailed(String),
    /// The request ran out of time
    Timeout(String),
    /// The server broke the exchange mid-flight
    ServerError { status: u16, message: String },
    /// The request was cancelled before completing
    Cancelled,
    /// The URL could not be turned into a request
    InvalidUrl(String),
    /// Anything the other variants do not cover
    Other(String),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::ConnectionFailed(msg) => write!(f, "connection failed: {}", msg),
            HttpError::Timeout(msg) => write!(f, "request timed out: {}", msg),
            HttpError::ServerError { status, message } => {
                write!(f, "server error {}: {}", status, message)
            }
            HttpError::Cancelled => write!(f, "request cancelled"),
            HttpError::InvalidUrl(msg) => write!(f, "invalid url: {}", msg),
            HttpError::Other(msg) => write!(f, "transport error: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

/// A GET-capable HTTP transport.
///
/// Implementations: [`ReqwestHttpClient`] for production,
/// [`MockHttpClient`] for tests.
///
/// [`ReqwestHttpClient`]: crate::adapters::ReqwestHttpClient
/// [`MockHttpClient`]: crate::adapters::mock::MockHttpClient
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a GET request against `url` with the given headers.
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError>;
}
