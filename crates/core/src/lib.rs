//! Core types and shared functionality for squirrel.
//!
//! This crate provides:
//! - The SQLite tab archive (schema lifecycle, queries, tab store)
//! - Archive orchestration with favicon enrichment
//! - Unified error types
//! - Configuration structures

pub mod archive;
pub mod config;
pub mod error;
pub mod store;

pub use archive::{ArchiveController, EnrichmentPipeline, FaviconLookup, SavedTabs, TabEntry, TabList, TabListOptions};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use store::{ArchiveDb, ArchiveView, DbLocation, SchemaManager, TabStore};
