//! Posts feed session: join/projection engine plus mutation coordinator.
//!
//! `PostsFeed` owns the paged source, kicks off the two bulk aggregate
//! fetches, and runs a join task that recomputes the joined output
//! whenever the page snapshot, the authors state, or the comments state
//! changes. The combine is latest-wins: `watch` channels collapse rapid
//! successive updates, so only the most recent combination is processed.
//!
//! Outputs are two distinct primitives, never conflated:
//! - the continuous state (`watch`): always holds the latest fully-joined
//!   snapshot and replays it to new subscribers;
//! - the one-shot news channel (`broadcast`): outcome and error events,
//!   delivered at most once per event to active subscribers, no replay.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, watch};
use tokio::task::AbortHandle;
use tracing::{debug, error, warn};

use crate::api::PostsApiClient;
use crate::error::JoinError;
use crate::events::{FetchState, PostsNews};
use crate::models::{Author, Comment, JoinedPost, Post};
use crate::paging::PostPager;
use crate::store::PostStore;

/// Human-readable failure messages carried by `PostsNews::ErrorState`.
pub const ERROR_GETTING_POSTS: &str = "An error occurred getting the posts";
pub const ERROR_DELETING_POST: &str = "An error occurred deleting the post";
pub const ERROR_DELETING_NON_FAVORITE_POSTS: &str =
    "An error occurred deleting the non-favorite posts";
pub const ERROR_UPDATING_POST: &str = "An error occurred updating the post";

const NEWS_CAPACITY: usize = 16;

/// A posts feed session.
///
/// All spawned tasks are bound to this value's lifetime: dropping the
/// feed aborts the join task, the bulk fetches, and any in-flight
/// mutations. Subscribe to the news channel before calling
/// [`activate`] to observe events from the initial load.
///
/// [`activate`]: PostsFeed::activate
pub struct PostsFeed {
    api: PostsApiClient,
    store: Arc<PostStore>,
    pager: Arc<PostPager>,
    authors_tx: watch::Sender<FetchState<Author>>,
    comments_tx: watch::Sender<FetchState<Comment>>,
    joined_tx: watch::Sender<Vec<JoinedPost>>,
    news_tx: broadcast::Sender<PostsNews>,
    activated: AtomicBool,
    tasks: Mutex<Vec<AbortHandle>>,
}

impl PostsFeed {
    /// Create a feed over an API client and a backing store.
    pub fn new(api: PostsApiClient, store: Arc<PostStore>, page_size: u64) -> Self {
        let pager = Arc::new(PostPager::new(api.clone(), Arc::clone(&store), page_size));
        let (authors_tx, _) = watch::channel(FetchState::Pending);
        let (comments_tx, _) = watch::channel(FetchState::Pending);
        let (joined_tx, _) = watch::channel(Vec::new());
        let (news_tx, _) = broadcast::channel(NEWS_CAPACITY);
        Self {
            api,
            store,
            pager,
            authors_tx,
            comments_tx,
            joined_tx,
            news_tx,
            activated: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// The paged source adapter, for refresh/retry/load-next and the
    /// load-state signal.
    pub fn pager(&self) -> &Arc<PostPager> {
        &self.pager
    }

    /// The backing store shared with the pager and the mutations.
    pub fn store(&self) -> &Arc<PostStore> {
        &self.store
    }

    /// Subscribe to the continuous joined output.
    ///
    /// Replays the latest fully-joined snapshot to new subscribers.
    pub fn joined_posts(&self) -> watch::Receiver<Vec<JoinedPost>> {
        self.joined_tx.subscribe()
    }

    /// Subscribe to the one-shot news channel.
    ///
    /// Events are delivered at most once per active subscriber; late
    /// subscribers see nothing prior, and lagging subscribers skip
    /// missed events.
    pub fn subscribe_news(&self) -> broadcast::Receiver<PostsNews> {
        self.news_tx.subscribe()
    }

    /// Start the session: spawn the join task, the two bulk aggregate
    /// fetches, and the initial page load.
    ///
    /// Idempotent; only the first call has an effect.
    pub fn activate(&self) {
        if self.activated.swap(true, Ordering::SeqCst) {
            return;
        }

        self.spawn_join_task();
        self.spawn_authors_fetch();
        self.spawn_comments_fetch();
        self.spawn_initial_load();
    }

    /// Delete one post from the backing store.
    ///
    /// Runs as its own task; the outcome arrives on the news channel as
    /// `PostDeletedSuccessfully(id)` or `ErrorState`. Does not refresh
    /// the paged stream.
    pub fn delete_post(&self, post_id: i64) {
        let store = Arc::clone(&self.store);
        let news = self.news_tx.clone();
        self.spawn(async move {
            match store.delete_post(post_id) {
                Ok(()) => {
                    let _ = news.send(PostsNews::PostDeletedSuccessfully(post_id));
                }
                Err(err) => {
                    warn!(post_id, error = %err, "delete failed");
                    let _ = news.send(PostsNews::ErrorState(ERROR_DELETING_POST.to_string()));
                }
            }
        });
    }

    /// Delete every non-favorite post from the backing store.
    ///
    /// Outcome: `NonFavoritePostsDeletedSuccessfully` or `ErrorState`.
    pub fn delete_non_favorite_posts(&self) {
        let store = Arc::clone(&self.store);
        let news = self.news_tx.clone();
        self.spawn(async move {
            match store.delete_non_favorite_posts() {
                Ok(removed) => {
                    debug!(removed, "bulk delete finished");
                    let _ = news.send(PostsNews::NonFavoritePostsDeletedSuccessfully);
                }
                Err(err) => {
                    warn!(error = %err, "bulk delete failed");
                    let _ = news.send(PostsNews::ErrorState(
                        ERROR_DELETING_NON_FAVORITE_POSTS.to_string(),
                    ));
                }
            }
        });
    }

    /// Set a post's favorite flag in the backing store.
    ///
    /// Outcome: `PostUpdatedSuccessfully(id)` or `ErrorState`.
    pub fn update_favorite_post(&self, post_id: i64, favorite: bool) {
        let store = Arc::clone(&self.store);
        let news = self.news_tx.clone();
        self.spawn(async move {
            match store.update_favorite(post_id, favorite) {
                Ok(()) => {
                    let _ = news.send(PostsNews::PostUpdatedSuccessfully(post_id));
                }
                Err(err) => {
                    warn!(post_id, error = %err, "favorite update failed");
                    let _ = news.send(PostsNews::ErrorState(ERROR_UPDATING_POST.to_string()));
                }
            }
        });
    }

    /// Join one post snapshot with author and comment snapshots.
    ///
    /// Strict projection: every post must resolve to exactly one author;
    /// a missing author fails the whole pass so that no partial join is
    /// ever published.
    pub fn project(
        posts: &[Post],
        authors: &[Author],
        comments: &[Comment],
    ) -> Result<Vec<JoinedPost>, JoinError> {
        posts
            .iter()
            .map(|post| {
                let author = authors
                    .iter()
                    .find(|author| author.id == post.user_id)
                    .ok_or(JoinError::AuthorMissing {
                        post_id: post.id,
                        user_id: post.user_id,
                    })?;
                let post_comments: Vec<Comment> = comments
                    .iter()
                    .filter(|comment| comment.post_id == post.id)
                    .cloned()
                    .collect();
                Ok(JoinedPost::new(post.clone(), author.clone(), post_comments))
            })
            .collect()
    }

    /// Spawn the combine-latest join task.
    fn spawn_join_task(&self) {
        let mut pages_rx = self.pager.snapshot();
        let mut authors_rx = self.authors_tx.subscribe();
        let mut comments_rx = self.comments_tx.subscribe();
        let joined_tx = self.joined_tx.clone();
        let news_tx = self.news_tx.clone();

        self.spawn(async move {
            loop {
                // One recomputation per upstream change; watch semantics
                // collapse bursts to the latest value.
                tokio::select! {
                    changed = pages_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    changed = authors_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    changed = comments_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }

                let posts = pages_rx.borrow_and_update().clone();
                let authors_state = authors_rx.borrow_and_update().clone();
                let comments_state = comments_rx.borrow_and_update().clone();

                match (&authors_state, &comments_state) {
                    (FetchState::Loaded(authors), FetchState::Loaded(comments)) => {
                        match Self::project(&posts, authors, comments) {
                            Ok(joined) => {
                                debug!(count = joined.len(), "publishing joined snapshot");
                                joined_tx.send_replace(joined);
                            }
                            Err(err) => {
                                error!(error = %err, "join integrity violation");
                                let _ = news_tx.send(PostsNews::ErrorState(format!(
                                    "{}: {}",
                                    ERROR_GETTING_POSTS, err
                                )));
                            }
                        }
                    }
                    _ => {
                        // A bulk fetch failed or has not completed yet;
                        // the continuous output keeps its previous value.
                        let _ = news_tx.send(PostsNews::ErrorState(
                            ERROR_GETTING_POSTS.to_string(),
                        ));
                    }
                }
            }
            debug!("join task finished");
        });
    }

    fn spawn_authors_fetch(&self) {
        let api = self.api.clone();
        let authors_tx = self.authors_tx.clone();
        self.spawn(async move {
            let state = match api.fetch_authors().await {
                Ok(authors) => FetchState::Loaded(authors),
                Err(err) => {
                    warn!(error = %err, "authors fetch failed");
                    FetchState::Failed(err.to_string())
                }
            };
            authors_tx.send_replace(state);
        });
    }

    fn spawn_comments_fetch(&self) {
        let api = self.api.clone();
        let comments_tx = self.comments_tx.clone();
        self.spawn(async move {
            let state = match api.fetch_comments().await {
                Ok(comments) => FetchState::Loaded(comments),
                Err(err) => {
                    warn!(error = %err, "comments fetch failed");
                    FetchState::Failed(err.to_string())
                }
            };
            comments_tx.send_replace(state);
        });
    }

    fn spawn_initial_load(&self) {
        let pager = Arc::clone(&self.pager);
        let news = self.news_tx.clone();
        self.spawn(async move {
            if let Err(err) = pager.load_next().await {
                warn!(error = %err, "initial page load failed");
                let _ = news.send(PostsNews::ErrorState(ERROR_GETTING_POSTS.to_string()));
            }
        });
    }

    /// Spawn a task bound to this session's lifetime.
    fn spawn<F>(&self, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        self.tasks.lock().unwrap().push(handle.abort_handle());
    }
}

impl Drop for PostsFeed {
    fn drop(&mut self) {
        for handle in self.tasks.lock().unwrap().drain(..) {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for PostsFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostsFeed")
            .field("activated", &self.activated.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
