//! postfeed - a paginated posts feed client with author/comment aggregation.
//!
//! Posts are loaded page by page through a remote-plus-local backing
//! store, joined with the bulk-fetched author and comment collections,
//! and published on two channels: a continuous replay-latest snapshot
//! and a one-shot news channel for mutation outcomes and errors.
//! [`feed::PostsFeed`] is the entry point.

pub mod adapters;
pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod feed;
pub mod models;
pub mod paging;
pub mod store;
pub mod traits;
