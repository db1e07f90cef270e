//! Trait abstractions for external dependencies.
//!
//! These traits are the dependency-injection seams of the crate: the
//! production adapters live in `crate::adapters`, and mock
//! implementations for tests live in `crate::adapters::mock`.

pub mod http;

pub use http::{Headers, HttpClient, HttpError, Response};
