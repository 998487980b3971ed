//! Ordered collection of tabs waiting to be archived.

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One open tab as reported by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TabEntry {
    pub url: String,
    pub title: String,
}

impl TabEntry {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self { url: url.into(), title: title.into() }
    }
}

/// Construction options for [`TabList`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TabListOptions {
    /// Existing session to archive into; a new one is created when `None`.
    pub session_id: Option<i64>,
    /// Keep repeated URLs instead of dropping them.
    pub allow_duplicate_urls: bool,
}

/// Tabs to archive, in the order they will be inserted.
#[derive(Debug, Clone, Default)]
pub struct TabList {
    session_id: Option<i64>,
    allow_duplicate_urls: bool,
    entries: Vec<TabEntry>,
    seen: HashSet<String>,
}

impl TabList {
    pub fn new(options: TabListOptions) -> Self {
        Self {
            session_id: options.session_id,
            allow_duplicate_urls: options.allow_duplicate_urls,
            entries: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Build a list from `entries`, applying the duplicate policy.
    pub fn from_entries(options: TabListOptions, entries: impl IntoIterator<Item = TabEntry>) -> Self {
        let mut list = Self::new(options);
        for entry in entries {
            list.push(entry.url, entry.title);
        }
        list
    }

    /// Append a tab. Returns `false` when the URL is a rejected duplicate.
    pub fn push(&mut self, url: impl Into<String>, title: impl Into<String>) -> bool {
        let url = url.into();
        if !self.seen.insert(url.clone()) && !self.allow_duplicate_urls {
            return false;
        }
        self.entries.push(TabEntry { url, title: title.into() });
        true
    }

    pub fn session_id(&self) -> Option<i64> {
        self.session_id
    }

    pub fn allows_duplicate_urls(&self) -> bool {
        self.allow_duplicate_urls
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TabEntry] {
        &self.entries
    }

    pub fn into_parts(self) -> (Option<i64>, Vec<TabEntry>) {
        (self.session_id, self.entries)
    }
}
