//! Shared fixtures for the integration tests: a mock transport
//! pre-loaded with a small closed dataset, and helpers for waiting on
//! the feed's outputs.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use postfeed::adapters::mock::{MockHttpClient, MockResponse};
use postfeed::api::PostsApiClient;
use postfeed::feed::PostsFeed;
use postfeed::models::JoinedPost;
use postfeed::store::PostStore;
use postfeed::traits::Response;

pub const BASE: &str = "https://api.test";

pub fn post_json(id: i64, user_id: i64) -> String {
    format!(
        r#"{{"id":{},"userId":{},"title":"title {}","body":"body {}"}}"#,
        id, user_id, id, id
    )
}

pub fn user_json(id: i64) -> String {
    format!(
        r#"{{"id":{},"name":"Author {}","username":"author{}","email":"author{}@example.com"}}"#,
        id, id, id, id
    )
}

pub fn comment_json(id: i64, post_id: i64) -> String {
    format!(
        r#"{{"postId":{},"id":{},"name":"comment {}","email":"c@example.com","body":"text"}}"#,
        post_id, id, id
    )
}

pub fn json_array(items: Vec<String>) -> String {
    format!("[{}]", items.join(","))
}

pub fn ok_json(body: String) -> MockResponse {
    MockResponse::Success(Response::new(200, Bytes::from(body)))
}

/// Mock transport for a closed dataset: posts 1..=2 owned by authors
/// 10 and 20, with two comments on post 1 and one on post 2.
pub fn mock_with_fixtures() -> MockHttpClient {
    let mock = MockHttpClient::new();
    mock.set_response(
        "https://api.test/posts?_start=0&_limit=2",
        ok_json(json_array(vec![post_json(1, 10), post_json(2, 20)])),
    );
    mock.set_response(
        "https://api.test/users",
        ok_json(json_array(vec![user_json(10), user_json(20)])),
    );
    mock.set_response(
        "https://api.test/comments",
        ok_json(json_array(vec![
            comment_json(100, 1),
            comment_json(101, 1),
            comment_json(102, 2),
        ])),
    );
    mock
}

pub fn feed_with(mock: &MockHttpClient, page_size: u64) -> PostsFeed {
    let api = PostsApiClient::with_base_url(Arc::new(mock.clone()), BASE);
    PostsFeed::new(api, Arc::new(PostStore::new()), page_size)
}

/// Wait until the joined output satisfies a predicate, or panic after
/// a few seconds.
pub async fn wait_for_joined<F>(
    rx: &mut tokio::sync::watch::Receiver<Vec<JoinedPost>>,
    predicate: F,
) -> Vec<JoinedPost>
where
    F: Fn(&[JoinedPost]) -> bool,
{
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        loop {
            {
                let joined = rx.borrow_and_update();
                if predicate(&joined) {
                    return (*joined).clone();
                }
            }
            rx.changed().await.expect("joined channel closed");
        }
    })
    .await
    .expect("timed out waiting for joined output")
}

/// Receive the next news event, or panic after a few seconds.
pub async fn next_news(
    rx: &mut tokio::sync::broadcast::Receiver<postfeed::events::PostsNews>,
) -> postfeed::events::PostsNews {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for news")
        .expect("news channel closed")
}
