//! One-shot outcome events and bulk-fetch states.
//!
//! `PostsNews` travels on the feed's broadcast channel: each event is
//! delivered at most once to currently-active subscribers and is never
//! replayed. `FetchState` is the tagged state of a bulk fetch and lives
//! on the continuous (replay-latest) side.

/// Outcome notification published on the one-shot news channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostsNews {
    /// A post's favorite flag was updated in the backing store.
    PostUpdatedSuccessfully(i64),
    /// A post was deleted from the backing store.
    PostDeletedSuccessfully(i64),
    /// All non-favorite posts were deleted from the backing store.
    NonFavoritePostsDeletedSuccessfully,
    /// An operation failed; carries a human-readable message.
    ErrorState(String),
}

/// State of one bulk aggregate fetch (authors or comments).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState<T> {
    /// The fetch has not completed yet.
    Pending,
    /// The complete collection was fetched.
    Loaded(Vec<T>),
    /// The fetch failed; carries a human-readable message.
    Failed(String),
}

impl<T> FetchState<T> {
    /// Whether this state holds a successfully fetched collection.
    pub fn is_loaded(&self) -> bool {
        matches!(self, FetchState::Loaded(_))
    }

    /// The fetched collection, if loaded.
    pub fn as_loaded(&self) -> Option<&[T]> {
        match self {
            FetchState::Loaded(items) => Some(items),
            _ => None,
        }
    }
}
