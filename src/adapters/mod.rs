//! Adapter implementations of the crate's trait abstractions.
//!
//! Production adapters wrap real dependencies (reqwest); the `mock`
//! submodule provides configurable test doubles.

pub mod mock;
pub mod reqwest_http;

pub use reqwest_http::ReqwestHttpClient;
