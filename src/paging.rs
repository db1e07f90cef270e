//! Paged source adapter over the remote-plus-local backing store.
//!
//! `PostPager` is an explicit page-cursor state machine. `load_next`
//! populates the next page (from the local store when possible,
//! otherwise from the remote API), `refresh` invalidates everything and
//! restarts from the first page preferring the remote source, and
//! `retry` re-attempts the most recently failed load.
//!
//! Two continuous outputs, both `watch` channels (replay-latest):
//! the accumulated post snapshot, and a [`LoadState`] signal that tracks
//! the **refresh** operation only. Midstream page failures surface on
//! the returned `Result`, not on the load-state signal.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::api::PostsApiClient;
use crate::error::ApiError;
use crate::models::Post;
use crate::store::PostStore;

/// A bounded, ordered batch of posts plus the cursor for the next batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// The posts in this page
    pub posts: Vec<Post>,
    /// Offset of the next page, or `None` when this page is the last
    pub next_offset: Option<u64>,
}

/// Load state of the refresh operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// No refresh in flight
    NotLoading,
    /// A refresh is in flight
    Loading,
    /// The last refresh failed
    Error(String),
}

/// The most recently failed load, remembered for `retry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailedLoad {
    Refresh,
    Page { offset: u64 },
}

/// Cursor state guarded by one async mutex so page loads serialize.
#[derive(Debug)]
struct PagerCursor {
    /// Offset of the next page to load; `None` once the source is exhausted
    next_offset: Option<u64>,
    /// Total number of posts in the published snapshot
    loaded: u64,
    /// The most recently failed load, if any
    failed: Option<FailedLoad>,
}

/// Paged source adapter for posts.
pub struct PostPager {
    api: PostsApiClient,
    store: Arc<PostStore>,
    page_size: u64,
    cursor: Mutex<PagerCursor>,
    snapshot_tx: watch::Sender<Vec<Post>>,
    load_state_tx: watch::Sender<LoadState>,
}

impl PostPager {
    /// Create a pager over an API client and a backing store.
    pub fn new(api: PostsApiClient, store: Arc<PostStore>, page_size: u64) -> Self {
        let (snapshot_tx, _) = watch::channel(Vec::new());
        let (load_state_tx, _) = watch::channel(LoadState::NotLoading);
        Self {
            api,
            store,
            page_size,
            cursor: Mutex::new(PagerCursor {
                next_offset: Some(0),
                loaded: 0,
                failed: None,
            }),
            snapshot_tx,
            load_state_tx,
        }
    }

    /// Subscribe to the accumulated post snapshot.
    ///
    /// The receiver replays the latest snapshot to new subscribers and
    /// collapses rapid successive updates (latest-wins).
    pub fn snapshot(&self) -> watch::Receiver<Vec<Post>> {
        self.snapshot_tx.subscribe()
    }

    /// Subscribe to the refresh load-state signal.
    pub fn load_state(&self) -> watch::Receiver<LoadState> {
        self.load_state_tx.subscribe()
    }

    /// Load the next page and publish the grown snapshot.
    ///
    /// Serves from the local store when it holds a full page at the
    /// cursor and the prefer-remote flag is not set; otherwise fetches
    /// from the remote API and upserts the page into the store. A no-op
    /// once the source is exhausted.
    ///
    /// # Errors
    /// Returns the API error of a failed remote load; the failed page is
    /// remembered and can be re-attempted with [`retry`].
    ///
    /// [`retry`]: PostPager::retry
    pub async fn load_next(&self) -> Result<(), ApiError> {
        let mut cursor = self.cursor.lock().await;
        self.load_page_at_cursor(&mut cursor).await
    }

    /// Invalidate all cached pages and restart from the first page,
    /// preferring the remote source.
    ///
    /// Drives the load-state signal Loading -> NotLoading / Error.
    ///
    /// # Errors
    /// Returns the API error of a failed first-page load; `retry`
    /// re-attempts the whole refresh.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let mut cursor = self.cursor.lock().await;

        // Durable flag: the next page population must hit the remote.
        self.store.set_prefer_remote(true);
        self.store.invalidate();
        cursor.next_offset = Some(0);
        cursor.loaded = 0;
        self.load_state_tx.send_replace(LoadState::Loading);
        debug!("refreshing paged source");

        match self.load_page_at_cursor(&mut cursor).await {
            Ok(()) => {
                cursor.failed = None;
                self.load_state_tx.send_replace(LoadState::NotLoading);
                Ok(())
            }
            Err(err) => {
                cursor.failed = Some(FailedLoad::Refresh);
                self.load_state_tx.send_replace(LoadState::Error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Re-attempt the most recently failed load.
    ///
    /// A failed refresh is re-run as a refresh; a failed midstream page
    /// load is re-run at the same offset. A no-op when nothing failed.
    pub async fn retry(&self) -> Result<(), ApiError> {
        let failed = {
            let cursor = self.cursor.lock().await;
            cursor.failed
        };
        match failed {
            None => Ok(()),
            Some(FailedLoad::Refresh) => self.refresh().await,
            Some(FailedLoad::Page { .. }) => {
                // The cursor never advanced past the failed page.
                self.load_next().await
            }
        }
    }

    /// Whether every page has been loaded.
    pub async fn is_exhausted(&self) -> bool {
        self.cursor.lock().await.next_offset.is_none()
    }

    /// Load the page at the cursor and publish the snapshot.
    async fn load_page_at_cursor(&self, cursor: &mut PagerCursor) -> Result<(), ApiError> {
        let offset = match cursor.next_offset {
            Some(offset) => offset,
            None => {
                debug!("paged source exhausted, ignoring load");
                return Ok(());
            }
        };

        let prefer_remote = self.store.take_prefer_remote();
        let cached = self.store.page(offset, self.page_size);

        let posts = if !prefer_remote && cached.len() as u64 == self.page_size {
            debug!(offset, "serving page from local store");
            cursor.next_offset = Some(offset + cached.len() as u64);
            cached
        } else {
            let page = match self.api.fetch_posts_page(offset, self.page_size).await {
                Ok(page) => page,
                Err(err) => {
                    warn!(offset, error = %err, "page load failed");
                    cursor.failed = Some(FailedLoad::Page { offset });
                    return Err(err);
                }
            };
            cursor.next_offset = page.next_offset;
            self.store.upsert_posts(page.posts.clone());
            page.posts
        };

        cursor.failed = None;
        cursor.loaded = offset + posts.len() as u64;
        let snapshot = self.store.page(0, cursor.loaded);
        self.snapshot_tx.send_replace(snapshot);
        Ok(())
    }
}
