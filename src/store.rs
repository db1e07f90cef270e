//! In-memory backing store for posts.
//!
//! `PostStore` is the local half of the remote-plus-local backing store:
//! it caches pages fetched from the remote API and owns the three
//! mutations (delete, bulk delete, favorite toggle). Posts are keyed by
//! id in an ordered map, so page reads are stable across passes.
//!
//! Favorite marks are tracked separately from the cached pages: the
//! remote payload never carries the flag, and a cache invalidation must
//! not erase what the user marked. Re-fetched posts pick their mark
//! back up on upsert.
//!
//! The store also carries the durable prefer-remote flag: `refresh()`
//! on the pager sets it, and the next page population consumes it to
//! bypass the cache.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::error::StoreError;
use crate::models::Post;

#[derive(Debug, Default)]
struct StoreInner {
    /// Cached posts keyed by id
    posts: BTreeMap<i64, Post>,
    /// Ids the user marked favorite; survives cache invalidation
    favorites: BTreeSet<i64>,
}

/// Thread-safe in-memory post store.
///
/// All methods take `&self`; interior locking is short and never held
/// across an await point. The three mutations report a poisoned lock
/// as [`StoreError::Poisoned`] instead of panicking, so a wrecked
/// store surfaces as a failure event rather than a crash.
#[derive(Debug, Default)]
pub struct PostStore {
    inner: RwLock<StoreInner>,
    prefer_remote: AtomicBool,
}

impl PostStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap()
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreInner>, StoreError> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }

    /// Insert or replace a batch of posts.
    ///
    /// An incoming post replaces any cached post with the same id. The
    /// favorite flag is reapplied from the store's own marks; the
    /// remote payload never carries it, so a re-fetch of a marked post
    /// stays marked.
    pub fn upsert_posts(&self, incoming: Vec<Post>) {
        let mut guard = self.inner.write().unwrap();
        let inner = &mut *guard;
        for mut post in incoming {
            if inner.favorites.contains(&post.id) {
                post.favorite = true;
            } else if post.favorite {
                inner.favorites.insert(post.id);
            }
            inner.posts.insert(post.id, post);
        }
    }

    /// Read one page of cached posts in id order.
    pub fn page(&self, offset: u64, limit: u64) -> Vec<Post> {
        self.read()
            .posts
            .values()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect()
    }

    /// All cached posts in id order.
    pub fn all(&self) -> Vec<Post> {
        self.read().posts.values().cloned().collect()
    }

    /// Look up a single post.
    pub fn get(&self, id: i64) -> Option<Post> {
        self.read().posts.get(&id).cloned()
    }

    /// Whether a post with this id is cached.
    pub fn contains(&self, id: i64) -> bool {
        self.read().posts.contains_key(&id)
    }

    /// Number of cached posts.
    pub fn len(&self) -> usize {
        self.read().posts.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.read().posts.is_empty()
    }

    /// Delete one post and its favorite mark.
    ///
    /// # Errors
    /// [`StoreError::PostNotFound`] when no post has this id;
    /// [`StoreError::Poisoned`] when the lock is wrecked.
    pub fn delete_post(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        match inner.posts.remove(&id) {
            Some(_) => {
                inner.favorites.remove(&id);
                debug!(post_id = id, "deleted post");
                Ok(())
            }
            None => Err(StoreError::PostNotFound(id)),
        }
    }

    /// Delete every post that is not marked favorite.
    ///
    /// Returns the number of posts removed.
    ///
    /// # Errors
    /// [`StoreError::Poisoned`] when the lock is wrecked.
    pub fn delete_non_favorite_posts(&self) -> Result<usize, StoreError> {
        let mut inner = self.write()?;
        let before = inner.posts.len();
        inner.posts.retain(|_, post| post.favorite);
        let removed = before - inner.posts.len();
        debug!(removed, "deleted non-favorite posts");
        Ok(removed)
    }

    /// Set a post's favorite flag and record the mark.
    ///
    /// # Errors
    /// [`StoreError::PostNotFound`] when no post has this id;
    /// [`StoreError::Poisoned`] when the lock is wrecked.
    pub fn update_favorite(&self, id: i64, favorite: bool) -> Result<(), StoreError> {
        let mut guard = self.write()?;
        let inner = &mut *guard;
        match inner.posts.get_mut(&id) {
            Some(post) => {
                post.favorite = favorite;
                if favorite {
                    inner.favorites.insert(id);
                } else {
                    inner.favorites.remove(&id);
                }
                debug!(post_id = id, favorite, "updated favorite flag");
                Ok(())
            }
            None => Err(StoreError::PostNotFound(id)),
        }
    }

    /// Drop all cached pages.
    ///
    /// Favorite marks stay; posts re-fetched after the invalidation
    /// pick their mark back up on upsert.
    pub fn invalidate(&self) {
        self.inner.write().unwrap().posts.clear();
        debug!("invalidated post cache");
    }

    /// Set the durable prefer-remote flag.
    ///
    /// The next page population consumes it via [`take_prefer_remote`]
    /// and fetches from the remote source even when a cached page exists.
    ///
    /// [`take_prefer_remote`]: PostStore::take_prefer_remote
    pub fn set_prefer_remote(&self, value: bool) {
        self.prefer_remote.store(value, Ordering::SeqCst);
    }

    /// Consume the prefer-remote flag, resetting it to `false`.
    pub fn take_prefer_remote(&self) -> bool {
        self.prefer_remote.swap(false, Ordering::SeqCst)
    }

    /// Peek at the prefer-remote flag without consuming it.
    pub fn prefer_remote(&self) -> bool {
        self.prefer_remote.load(Ordering::SeqCst)
    }

    /// Wreck the lock by panicking while holding the write guard.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.inner.write().unwrap();
            panic!("poisoning store lock");
        }));
    }
}
