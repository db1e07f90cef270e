//! Scripted HTTP transport for tests.
//!
//! Responses are registered per URL and requests are recorded, so a
//! test can both drive the pipeline and assert on the traffic it
//! produced. No network access is involved.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::traits::{Headers, HttpClient, HttpError, Response};

/// A request the mock has seen, kept for assertions.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: String,
    /// Full request URL
    pub url: String,
    /// Headers as sent
    pub headers: Headers,
}

/// What the mock answers for a matched URL.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Hand back this response
    Success(Response),
    /// Fail the request with this transport error
    Error(HttpError),
}

#[derive(Debug, Default)]
struct MockState {
    /// URL patterns in registration order
    routes: Vec<(String, MockResponse)>,
    /// Answer for URLs no route matches
    fallback: Option<MockResponse>,
    /// Every request seen so far
    seen: Vec<RecordedRequest>,
}

/// Scripted [`HttpClient`] for tests.
///
/// Clones share state, so a test can hand one clone to the code under
/// test and keep another for scripting and assertions.
///
/// # Example
///
/// ```ignore
/// let mock = MockHttpClient::new();
/// mock.set_response(
///     "https://api.test/users",
///     MockResponse::Success(Response::new(200, Bytes::from("[]"))),
/// );
///
/// let response = mock.get("https://api.test/users", &Headers::new()).await?;
/// assert_eq!(response.status, 200);
/// assert_eq!(mock.get_requests().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    state: Arc<Mutex<MockState>>,
}

impl MockHttpClient {
    /// A mock with no routes and nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the answer for a URL pattern.
    ///
    /// Lookup tries an exact match first, then treats patterns as URL
    /// prefixes in registration order. Re-registering the same pattern
    /// replaces the previous answer in place.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        let mut state = self.state.lock().unwrap();
        match state.routes.iter_mut().find(|(pattern, _)| pattern == url) {
            Some(route) => route.1 = response,
            None => state.routes.push((url.to_string(), response)),
        }
    }

    /// Register the answer for URLs no route matches.
    pub fn set_default_response(&self, response: MockResponse) {
        self.state.lock().unwrap().fallback = Some(response);
    }

    /// All requests the mock has seen, oldest first.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().seen.clone()
    }

    /// Forget all recorded requests.
    pub fn clear_requests(&self) {
        self.state.lock().unwrap().seen.clear();
    }

    /// Drop every registered route (the fallback stays).
    pub fn clear_responses(&self) {
        self.state.lock().unwrap().routes.clear();
    }

    fn answer_for(&self, url: &str) -> Option<MockResponse> {
        let state = self.state.lock().unwrap();
        if let Some((_, response)) = state.routes.iter().find(|(pattern, _)| pattern == url) {
            return Some(response.clone());
        }
        if let Some((_, response)) = state
            .routes
            .iter()
            .find(|(pattern, _)| url.starts_with(pattern.as_str()))
        {
            return Some(response.clone());
        }
        state.fallback.clone()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.state.lock().unwrap().seen.push(RecordedRequest {
            method: "GET".to_string(),
            url: url.to_string(),
            headers: headers.clone(),
        });

        match self.answer_for(url) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(HttpError::Other(format!("no scripted response for {}", url))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_scripted_response_is_served_and_recorded() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "https://api.test/posts",
            MockResponse::Success(Response::new(200, Bytes::from("[]"))),
        );

        let response = mock
            .get("https://api.test/posts", &Headers::new())
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, Bytes::from("[]"));

        let seen = mock.get_requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, "GET");
        assert_eq!(seen[0].url, "https://api.test/posts");
    }

    #[tokio::test]
    async fn test_scripted_error_fails_the_request() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "https://api.test/users",
            MockResponse::Error(HttpError::Timeout("slow".to_string())),
        );

        let err = mock
            .get("https://api.test/users", &Headers::new())
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_prefix_match_covers_query_strings() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "https://api.test/posts",
            MockResponse::Success(Response::new(200, Bytes::from("[]"))),
        );

        let response = mock
            .get("https://api.test/posts?_start=0&_limit=20", &Headers::new())
            .await
            .unwrap();
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_reregistering_a_pattern_replaces_the_answer() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "https://api.test/posts",
            MockResponse::Error(HttpError::ConnectionFailed("down".to_string())),
        );
        mock.set_response(
            "https://api.test/posts",
            MockResponse::Success(Response::new(200, Bytes::from("[]"))),
        );

        let response = mock
            .get("https://api.test/posts", &Headers::new())
            .await
            .unwrap();
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_unmatched_url_uses_fallback_then_errors() {
        let mock = MockHttpClient::new();
        let err = mock
            .get("https://api.test/nothing", &Headers::new())
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Other(_)));

        mock.set_default_response(MockResponse::Success(Response::new(
            404,
            Bytes::from("not found"),
        )));
        let response = mock
            .get("https://api.test/nothing", &Headers::new())
            .await
            .unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_clones_share_routes_and_recordings() {
        let mock = MockHttpClient::new();
        let clone = mock.clone();
        clone.set_response(
            "https://api.test/comments",
            MockResponse::Success(Response::new(200, Bytes::from("[]"))),
        );

        mock.get("https://api.test/comments", &Headers::new())
            .await
            .unwrap();
        assert_eq!(clone.get_requests().len(), 1);

        mock.clear_requests();
        assert!(clone.get_requests().is_empty());
    }
}
