//! Entry point for archive operations.
//!
//! The controller waits once for the [`SchemaManager`] to report the archive
//! ready, then delegates to a [`TabStore`]. Reads pass through the
//! [`EnrichmentPipeline`] before being returned.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use super::enrich::{EnrichOptions, EnrichmentPipeline, FaviconLookup};
use super::tab_list::TabList;
use crate::Error;
use crate::config::AppConfig;
use crate::store::{ArchiveView, DbLocation, DeleteGroup, GroupRef, GroupingMode, NewTab, Page, SchemaManager, TabStore};

/// Result of [`ArchiveController::save_tab_list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTabs {
    pub session_id: i64,
    /// New tab ids, in input order.
    pub tab_ids: Vec<i64>,
}

/// Readiness-gated facade over the archive.
#[derive(Debug)]
pub struct ArchiveController {
    schema: Arc<SchemaManager>,
    store: OnceCell<TabStore>,
    enrichment: EnrichmentPipeline,
}

impl ArchiveController {
    pub fn new(schema: Arc<SchemaManager>, enrichment: EnrichmentPipeline) -> Self {
        Self { schema, store: OnceCell::new(), enrichment }
    }

    /// Build a controller for the archive at `config.db_path`.
    pub fn from_config(config: &AppConfig, lookup: Arc<dyn FaviconLookup>) -> Self {
        let schema = Arc::new(SchemaManager::new(
            DbLocation::File(config.db_path.clone()),
            config.statement_cache_capacity,
        ));
        Self::new(schema, EnrichmentPipeline::new(lookup, EnrichOptions::from(config)))
    }

    pub fn schema(&self) -> &Arc<SchemaManager> {
        &self.schema
    }

    /// The store, once the archive is ready.
    ///
    /// Readiness is awaited on first use only; later calls reuse the store.
    async fn store(&self) -> Result<&TabStore, Error> {
        self.store
            .get_or_try_init(|| async { self.schema.ready().await.map(|db| TabStore::new(&db)) })
            .await
    }

    /// Every session, newest first, with tabs and favicons.
    pub async fn get_archive(&self) -> Result<ArchiveView, Error> {
        self.get_archive_page(Page::default()).await
    }

    /// A window of sessions, newest first, with tabs and favicons.
    pub async fn get_archive_page(&self, page: Page) -> Result<ArchiveView, Error> {
        let store = self.store().await?;
        let groups = store.get_sessions(page).await?;
        let ids: Vec<i64> = groups.iter().map(|s| s.id).collect();
        let tabs = store.get_tabs_for_sessions(&ids).await?;
        let tabs = self.enrichment.enrich_groups(tabs).await;

        Ok(ArchiveView { groups, tabs, grouping_mode: GroupingMode::Session })
    }

    pub async fn create_session(&self) -> Result<i64, Error> {
        self.store().await?.create_session().await
    }

    pub async fn create_named_session(&self, name: Option<String>) -> Result<i64, Error> {
        self.store().await?.create_named_session(name).await
    }

    pub async fn create_tab(&self, url: &str, title: &str, session_id: i64) -> Result<i64, Error> {
        self.store().await?.create_tab(url, title, session_id).await
    }

    pub async fn delete_tab(&self, id: i64) -> Result<(), Error> {
        self.store().await?.delete_tab(id).await
    }

    /// Delete a group and the listed tabs. Returns the number of tabs deleted.
    pub async fn delete_group(&self, request: DeleteGroup) -> Result<usize, Error> {
        let group = GroupRef::try_from(&request)?;
        self.store().await?.delete_group(group, request.tab_ids).await
    }

    pub async fn delete_all(&self) -> Result<(), Error> {
        self.store().await?.delete_all().await
    }

    /// Archive `list` into its session, or a new one if it has none.
    ///
    /// Every URL is validated before anything is written. Domains, the
    /// session and the tab rows are then written in one transaction, in list
    /// order. An empty list still creates the session.
    pub async fn save_tab_list(&self, list: TabList) -> Result<SavedTabs, Error> {
        let (session_id, entries) = list.into_parts();
        let tabs = entries
            .into_iter()
            .map(|entry| NewTab::new(entry.url, entry.title))
            .collect::<Result<Vec<_>, _>>()?;

        let (session_id, tab_ids) = self.store().await?.insert_tabs(session_id, tabs).await?;
        tracing::info!(session_id, tabs = tab_ids.len(), "tab list archived");

        Ok(SavedTabs { session_id, tab_ids })
    }
}
