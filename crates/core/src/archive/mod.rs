//! Archive orchestration: collecting tabs, saving them, and reading them back
//! with favicons attached.

pub mod controller;
pub mod enrich;
pub mod tab_list;

pub use controller::{ArchiveController, SavedTabs};
pub use enrich::{EnrichOptions, EnrichmentPipeline, FaviconLookup};
pub use tab_list::{TabEntry, TabList, TabListOptions};
