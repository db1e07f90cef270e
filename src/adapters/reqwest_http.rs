//! Production HTTP transport backed by reqwest.

use async_trait::async_trait;

use crate::traits::{Headers, HttpClient, HttpError, Response};

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// [`HttpClient`] over a shared `reqwest::Client`.
///
/// Cloning is cheap and clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// A client with the crate's default timeout.
    ///
    /// Falls back to a plain client if the builder is rejected, which
    /// only happens with a broken TLS backend.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Wrap an already configured `reqwest::Client`.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// The underlying `reqwest::Client`.
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn classify(err: reqwest::Error) -> HttpError {
    if err.is_timeout() {
        HttpError::Timeout(err.to_string())
    } else if err.is_connect() {
        HttpError::ConnectionFailed(err.to_string())
    } else if err.is_builder() {
        HttpError::InvalidUrl(err.to_string())
    } else {
        HttpError::Other(err.to_string())
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        let mut builder = self.client.get(url);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }

        let upstream = builder.send().await.map_err(classify)?;

        let status = upstream.status().as_u16();
        let headers = upstream
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect();
        let body = upstream.bytes().await.map_err(classify)?;

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
