//! Database connection management with pragma configuration.
//!
//! This module handles opening the SQLite archive, applying required pragmas
//! for performance and integrity (WAL mode, enforced foreign keys), sizing the
//! prepared statement cache, and bringing the schema up to date.

use super::migrations;
use crate::Error;
use std::path::{Path, PathBuf};
use tokio_rusqlite::Connection;

/// Statement cache size used when the caller does not configure one.
pub const DEFAULT_STATEMENT_CACHE_CAPACITY: usize = 64;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA foreign_keys=ON;";

/// Where the archive lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    Memory,
}

impl From<&Path> for DbLocation {
    fn from(path: &Path) -> Self {
        DbLocation::File(path.to_path_buf())
    }
}

/// Archive database handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread. Clones share the same connection.
#[derive(Clone, Debug)]
pub struct ArchiveDb {
    pub(crate) conn: Connection,
    schema_version: i64,
    migrated: bool,
}

impl ArchiveDb {
    /// Open an archive at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies pragmas, and creates or
    /// migrates the schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::connect(&DbLocation::from(path.as_ref()), DEFAULT_STATEMENT_CACHE_CAPACITY).await
    }

    /// Open an in-memory archive for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        Self::connect(&DbLocation::Memory, DEFAULT_STATEMENT_CACHE_CAPACITY).await
    }

    /// Open an archive at `location` with an explicit statement cache size.
    ///
    /// If the schema cannot be created or migrated the connection is closed
    /// before the error is returned, so no half-initialized handle escapes.
    pub async fn connect(location: &DbLocation, statement_cache_capacity: usize) -> Result<Self, Error> {
        let conn = match location {
            DbLocation::File(path) => Connection::open(path).await,
            DbLocation::Memory => Connection::open_in_memory().await,
        }
        .map_err(|e| Error::Database(e.into()))?;

        conn.call(move |conn| {
            conn.execute_batch(PRAGMAS)?;
            conn.set_prepared_statement_cache_capacity(statement_cache_capacity);
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        let outcome = match migrations::run(&conn).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Err(close_err) = conn.close().await {
                    tracing::warn!(error = %close_err, "failed to close archive after schema error");
                }
                return Err(e);
            }
        };

        if outcome.is_migrated() {
            tracing::info!(
                from = outcome.previous,
                to = outcome.current,
                "archive schema created or migrated"
            );
        }

        Ok(Self { conn, schema_version: outcome.current, migrated: outcome.is_migrated() })
    }

    /// Schema version stamped in the archive after opening.
    pub fn schema_version(&self) -> i64 {
        self.schema_version
    }

    /// Whether this open created or migrated the schema.
    pub fn is_migrated(&self) -> bool {
        self.migrated
    }

    /// Close the underlying connection.
    ///
    /// Every clone of this handle observes the closed connection afterwards.
    pub async fn close(self) -> Result<(), Error> {
        self.conn.close().await.map_err(Error::Database)
    }
}
