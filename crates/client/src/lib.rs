//! Client code for squirrel.
//!
//! This crate provides the HTTP favicon lookup used to enrich archived tabs.

pub mod favicon;

pub use favicon::{FaviconConfig, HttpFaviconLookup};
