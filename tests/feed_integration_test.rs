// Integration tests for the join/projection pipeline: the combine of
// the paged snapshot with the authors and comments states, the
// continuous joined output, and the one-shot news channel.

mod common;

use common::*;

use postfeed::adapters::mock::MockResponse;
use postfeed::events::PostsNews;
use postfeed::feed::ERROR_GETTING_POSTS;
use postfeed::traits::HttpError;

#[tokio::test]
async fn joined_output_contains_every_post_with_author_and_comments() {
    let mock = mock_with_fixtures();
    let feed = feed_with(&mock, 2);

    let mut joined_rx = feed.joined_posts();
    feed.activate();

    let joined = wait_for_joined(&mut joined_rx, |j| j.len() == 2).await;

    let first = &joined[0];
    assert_eq!(first.id, 1);
    assert_eq!(first.author.id, 10);
    assert_eq!(first.author.name, "Author 10");
    assert_eq!(
        first.comments.iter().map(|c| c.id).collect::<Vec<_>>(),
        vec![100, 101]
    );

    let second = &joined[1];
    assert_eq!(second.id, 2);
    assert_eq!(second.author.id, 20);
    assert_eq!(
        second.comments.iter().map(|c| c.id).collect::<Vec<_>>(),
        vec![102]
    );

    // Transient flags always start cleared.
    assert!(joined.iter().all(|j| !j.menu_visible && !j.deleted));
}

#[tokio::test]
async fn consumer_observes_only_fully_joined_snapshots() {
    let mock = mock_with_fixtures();
    let feed = feed_with(&mock, 2);

    let mut joined_rx = feed.joined_posts();
    feed.activate();

    let joined = wait_for_joined(&mut joined_rx, |j| !j.is_empty()).await;

    // Whatever emission the consumer catches first, it is internally
    // consistent: every record resolved its author and comments.
    for record in &joined {
        assert_eq!(record.author.id, record.user_id);
        assert!(record.comments.iter().all(|c| c.post_id == record.id));
    }
}

#[tokio::test]
async fn authors_failure_leaves_continuous_output_untouched() {
    let mock = mock_with_fixtures();
    mock.set_response(
        "https://api.test/users",
        MockResponse::Error(HttpError::ConnectionFailed("down".to_string())),
    );
    let feed = feed_with(&mock, 2);

    let joined_rx = feed.joined_posts();
    let mut news_rx = feed.subscribe_news();
    feed.activate();

    // Every recomputation surfaces as one error event on the news
    // channel while the authors fetch is failed.
    let news = next_news(&mut news_rx).await;
    assert_eq!(news, PostsNews::ErrorState(ERROR_GETTING_POSTS.to_string()));

    // The continuous output never updated past its initial value.
    assert!(joined_rx.borrow().is_empty());
}

#[tokio::test]
async fn comments_failure_leaves_continuous_output_untouched() {
    let mock = mock_with_fixtures();
    mock.set_response(
        "https://api.test/comments",
        MockResponse::Error(HttpError::Timeout("slow".to_string())),
    );
    let feed = feed_with(&mock, 2);

    let joined_rx = feed.joined_posts();
    let mut news_rx = feed.subscribe_news();
    feed.activate();

    let news = next_news(&mut news_rx).await;
    assert_eq!(news, PostsNews::ErrorState(ERROR_GETTING_POSTS.to_string()));
    assert!(joined_rx.borrow().is_empty());
}

#[tokio::test]
async fn missing_author_fails_the_whole_join_pass() {
    let mock = mock_with_fixtures();
    // Author 20 vanishes from the snapshot; post 2 can no longer join.
    mock.set_response(
        "https://api.test/users",
        ok_json(json_array(vec![user_json(10)])),
    );
    let feed = feed_with(&mock, 2);

    let joined_rx = feed.joined_posts();
    let mut news_rx = feed.subscribe_news();
    feed.activate();

    // Wait for the integrity error; recomputations before all inputs
    // arrive may emit plain loading errors first.
    let deadline = std::time::Duration::from_secs(5);
    let integrity_error = tokio::time::timeout(deadline, async {
        loop {
            if let PostsNews::ErrorState(message) = next_news(&mut news_rx).await {
                if message.contains("missing author") {
                    return message;
                }
            }
        }
    })
    .await
    .expect("timed out waiting for integrity error");

    assert!(integrity_error.contains("post 2"));

    // No partial join was ever published.
    assert!(joined_rx.borrow().is_empty());
}

#[tokio::test]
async fn news_channel_does_not_replay_to_late_subscribers() {
    let mock = mock_with_fixtures();
    let feed = feed_with(&mock, 2);

    let mut joined_rx = feed.joined_posts();
    feed.activate();
    wait_for_joined(&mut joined_rx, |j| j.len() == 2).await;

    // Trigger an outcome event with no one listening.
    feed.delete_post(1);
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    // A subscriber arriving afterwards sees nothing prior.
    let mut late_rx = feed.subscribe_news();
    let result = tokio::time::timeout(
        std::time::Duration::from_millis(200),
        late_rx.recv(),
    )
    .await;
    assert!(result.is_err(), "late subscriber must not see old events");
}

#[tokio::test]
async fn rapid_upstream_emissions_collapse_to_the_final_join() {
    let mock = mock_with_fixtures();
    let feed = feed_with(&mock, 2);

    // This receiver stays unread while the page snapshot, the authors
    // and the comments all land and trigger their recomputations.
    let mut slow_rx = feed.joined_posts();
    let mut settle_rx = feed.joined_posts();
    feed.activate();
    wait_for_joined(&mut settle_rx, |j| j.len() == 2).await;

    // The blocked consumer wakes up once and observes only the final
    // fully-joined state; intermediate emissions were collapsed.
    assert!(slow_rx.has_changed().unwrap());
    slow_rx.changed().await.unwrap();
    assert_eq!(slow_rx.borrow_and_update().len(), 2);
    assert!(!slow_rx.has_changed().unwrap());
}

#[tokio::test]
async fn continuous_output_replays_latest_to_new_subscribers() {
    let mock = mock_with_fixtures();
    let feed = feed_with(&mock, 2);

    let mut joined_rx = feed.joined_posts();
    feed.activate();
    wait_for_joined(&mut joined_rx, |j| j.len() == 2).await;

    // A brand-new subscriber immediately observes the latest snapshot.
    let late_rx = feed.joined_posts();
    assert_eq!(late_rx.borrow().len(), 2);
}

#[tokio::test]
async fn dropping_the_feed_stops_all_tasks() {
    let mock = mock_with_fixtures();
    let feed = feed_with(&mock, 2);

    let mut joined_rx = feed.joined_posts();
    feed.activate();
    wait_for_joined(&mut joined_rx, |j| j.len() == 2).await;

    drop(feed);

    // The join task is gone; the channel reports closure.
    let closed = joined_rx.changed().await;
    assert!(closed.is_err());
}
