//! Favicon enrichment of archived tabs.
//!
//! Each tab gets one lookup against an injected [`FaviconLookup`]. Lookups run
//! concurrently, bounded by a semaphore shared across every group of one
//! enrichment call, and each lookup is capped by a timeout. Errors, empty
//! results and timeouts all resolve to a fallback icon derived from the tab's
//! host, so enrichment itself never fails.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

use crate::Error;
use crate::config::AppConfig;
use crate::store::domain_name::host_of;
use crate::store::{ArchivedTab, Tab};

/// Capability to find the favicon of a page.
///
/// Returns `Ok(None)` when the page has no icon.
#[async_trait]
pub trait FaviconLookup: Send + Sync {
    async fn lookup(&self, url: &Url) -> Result<Option<String>, Error>;
}

/// Tuning for [`EnrichmentPipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichOptions {
    /// Maximum lookups in flight.
    pub concurrency: usize,
    /// Per-lookup deadline.
    pub timeout: Duration,
    /// Prefix of the icon-by-domain fallback URL; the host is appended.
    pub fallback_service: String,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for EnrichOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            concurrency: config.favicon_concurrency,
            timeout: config.favicon_timeout(),
            fallback_service: config.favicon_fallback_service.clone(),
        }
    }
}

/// Attaches favicons to tabs.
#[derive(Clone)]
pub struct EnrichmentPipeline {
    lookup: Arc<dyn FaviconLookup>,
    options: EnrichOptions,
}

impl std::fmt::Debug for EnrichmentPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentPipeline").field("options", &self.options).finish_non_exhaustive()
    }
}

impl EnrichmentPipeline {
    pub fn new(lookup: Arc<dyn FaviconLookup>, options: EnrichOptions) -> Self {
        Self { lookup, options }
    }

    pub fn options(&self) -> &EnrichOptions {
        &self.options
    }

    /// Fallback icon for `url`, derived from its host.
    pub fn fallback_for(&self, url: &str) -> String {
        format!("{}{}", self.options.fallback_service, host_of(url))
    }

    fn limiter(&self) -> Arc<Semaphore> {
        Arc::new(Semaphore::new(self.options.concurrency.max(1)))
    }

    /// Enrich a flat list of tabs, preserving order.
    pub async fn enrich(&self, tabs: Vec<Tab>) -> Vec<ArchivedTab> {
        self.enrich_with(tabs, self.limiter()).await
    }

    /// Enrich session-grouped tabs.
    ///
    /// Each group completes its own fan-out and fan-in; the combined map is
    /// returned once every group has finished. Group and tab order are kept.
    pub async fn enrich_groups(&self, groups: IndexMap<i64, Vec<Tab>>) -> IndexMap<i64, Vec<ArchivedTab>> {
        let limiter = self.limiter();
        let mut slots: IndexMap<i64, Vec<ArchivedTab>> = IndexMap::with_capacity(groups.len());
        let mut join_set = JoinSet::new();

        for (group_id, tabs) in groups {
            slots.insert(group_id, self.fallback_all(&tabs));
            let pipeline = self.clone();
            let limiter = Arc::clone(&limiter);
            join_set.spawn(async move { (group_id, pipeline.enrich_with(tabs, limiter).await) });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((group_id, enriched)) => {
                    slots.insert(group_id, enriched);
                }
                Err(e) => tracing::warn!(error = %e, "favicon group task failed; keeping fallbacks"),
            }
        }

        slots
    }

    fn fallback_all(&self, tabs: &[Tab]) -> Vec<ArchivedTab> {
        tabs.iter()
            .map(|tab| ArchivedTab { favicon: self.fallback_for(&tab.url), tab: tab.clone() })
            .collect()
    }

    async fn enrich_with(&self, tabs: Vec<Tab>, limiter: Arc<Semaphore>) -> Vec<ArchivedTab> {
        let mut enriched = self.fallback_all(&tabs);
        let mut join_set = JoinSet::new();

        for (index, tab) in tabs.into_iter().enumerate() {
            let lookup = Arc::clone(&self.lookup);
            let limiter = Arc::clone(&limiter);
            let timeout = self.options.timeout;

            join_set.spawn(async move {
                // NOTE: Hold permit for the lookup to enforce the concurrency limit
                let Ok(_permit) = limiter.acquire_owned().await else {
                    return (index, None);
                };
                (index, resolve(lookup.as_ref(), &tab.url, timeout).await)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, Some(favicon))) => enriched[index].favicon = favicon,
                Ok((_, None)) => {}
                Err(e) => tracing::warn!(error = %e, "favicon lookup task failed; keeping fallback"),
            }
        }

        enriched
    }
}

/// Look up one favicon. `None` means the fallback applies.
async fn resolve(lookup: &dyn FaviconLookup, raw_url: &str, timeout: Duration) -> Option<String> {
    let url = match Url::parse(raw_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!(url = raw_url, error = %e, "unparseable tab url; using fallback favicon");
            return None;
        }
    };

    match tokio::time::timeout(timeout, lookup.lookup(&url)).await {
        Ok(Ok(Some(icon))) if !icon.is_empty() => Some(icon),
        Ok(Ok(_)) => {
            tracing::debug!(url = raw_url, "no favicon found; using fallback");
            None
        }
        Ok(Err(e)) => {
            tracing::debug!(url = raw_url, error = %e, "favicon lookup failed; using fallback");
            None
        }
        Err(_) => {
            tracing::warn!(url = raw_url, timeout_ms = timeout.as_millis() as u64, "favicon lookup timed out");
            None
        }
    }
}
