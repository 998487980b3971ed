//! SQLite-backed archive of sessions, domains and tabs.
//!
//! This module provides the persistent side of the archive using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Versioned schema creation and forward migrations
//! - A parameterized query layer with list-parameter expansion
//! - Session, domain and tab CRUD with explicit, non-cascading deletes
//! - A readiness-gated schema manager owning the shared connection

pub mod connection;
pub mod domain_name;
pub mod domains;
pub mod migrations;
pub mod model;
pub mod query;
pub mod schema;
pub mod sessions;
pub mod tabs;

pub use crate::Error;

pub use connection::{ArchiveDb, DbLocation};
pub use model::{ArchiveView, ArchivedTab, DeleteGroup, Domain, GroupId, GroupRef, GroupingMode, Page, Session, Tab};
pub use query::{ColumnArray, Executor, Query, QueryExecutor, Record, RowKey, Rows};
pub use schema::{ConnectionState, SchemaManager};
pub use tabs::NewTab;

/// Domain operations over the archive tables.
///
/// Cheap to clone; clones share the underlying connection.
#[derive(Clone, Debug)]
pub struct TabStore {
    exec: QueryExecutor,
}

impl TabStore {
    pub fn new(db: &ArchiveDb) -> Self {
        Self { exec: QueryExecutor::new(db) }
    }

    /// The query executor backing this store.
    pub fn executor(&self) -> &QueryExecutor {
        &self.exec
    }

    /// Delete every tab, session and domain, in foreign-key-safe order.
    pub async fn delete_all(&self) -> Result<(), Error> {
        self.exec
            .transaction(|ex| {
                let tabs = ex.execute(&Query::new("DELETE FROM tabs"))?;
                let sessions = ex.execute(&Query::new("DELETE FROM sessions"))?;
                let domains = ex.execute(&Query::new("DELETE FROM domains"))?;
                tracing::info!(tabs, sessions, domains, "archive cleared");
                Ok(())
            })
            .await
    }

    /// Delete `tab_ids`, then the group itself, in one transaction.
    ///
    /// Fails without deleting anything if the group still has other tabs.
    /// Returns the number of tabs actually deleted.
    pub async fn delete_group(&self, group: GroupRef, tab_ids: Vec<i64>) -> Result<usize, Error> {
        self.exec
            .transaction(move |ex| {
                let deleted = tabs::delete_tabs_in(ex, &tab_ids)?;
                match &group {
                    GroupRef::Session(id) => {
                        ex.execute(&Query::new("DELETE FROM sessions WHERE id = :id").bind("id", *id))?;
                    }
                    GroupRef::Domain(name) => {
                        ex.execute(&Query::new("DELETE FROM domains WHERE name = :name").bind("name", name.clone()))?;
                    }
                }
                tracing::debug!(?group, tabs = deleted, "group deleted");
                Ok(deleted)
            })
            .await
    }
}
