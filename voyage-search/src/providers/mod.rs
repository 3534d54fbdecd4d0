//! Concrete provider adapters.
//!
//! Each module provides a struct implementing [`crate::provider::SearchProvider`].

pub mod json_http;

pub use json_http::HttpProvider;
