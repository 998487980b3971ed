//! Database schema migrations.
//!
//! Uses a version table to track applied migrations. The stored schema
//! version is the highest applied entry; 0 means a fresh archive. Pending
//! migrations and their version stamps are applied in a single transaction,
//! so a failure leaves the previous schema untouched.

use super::Error;
use tokio_rusqlite::rusqlite::TransactionBehavior;
use tokio_rusqlite::{Connection, params};

/// Migration list: (version, SQL).
///
/// Migrations must be listed in ascending version order. Each new schema
/// revision appends one entry carrying the forward transformation from the
/// previous version.
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_archive.sql"))];

/// Schema version this build writes and expects.
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Result of bringing an archive up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationOutcome {
    /// Stored version before this run (0 for a fresh archive).
    pub previous: i64,
    /// Stored version after this run.
    pub current: i64,
}

impl MigrationOutcome {
    /// Whether the schema was created or migrated by this run.
    pub fn is_migrated(&self) -> bool {
        self.previous != self.current
    }
}

/// Read the stored schema version without modifying anything.
///
/// Returns 0 when the version table does not exist yet.
#[cfg(test)]
async fn stored_version(conn: &Connection) -> Result<i64, Error> {
    conn.call(|conn| -> Result<i64, Error> {
        let has_table: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='_migrations')",
            [],
            |row| row.get(0),
        )?;
        if !has_table {
            return Ok(0);
        }
        let version = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;
        Ok(version)
    })
    .await
    .map_err(Error::from)
}

/// Run any pending migrations.
///
/// Creates the _migrations table if it doesn't exist, checks the current
/// version, and applies every migration newer than it.
///
/// # Errors
///
/// Returns `Error::MigrationFailed` if a migration SQL fails to execute or the
/// archive was written by a newer schema than this build knows.
pub async fn run(conn: &Connection) -> Result<MigrationOutcome, Error> {
    conn.call(|conn| -> Result<MigrationOutcome, Error> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let previous: i64 = tx.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        if previous > CURRENT_SCHEMA_VERSION {
            return Err(Error::MigrationFailed(format!(
                "archive schema version {previous} is newer than supported version {CURRENT_SCHEMA_VERSION}"
            )));
        }

        for (version, sql) in MIGRATIONS {
            if *version > previous {
                tx.execute_batch(sql)
                    .map_err(|e| Error::MigrationFailed(format!("version {version}: {e}")))?;
                tx.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                    params![version, chrono::Utc::now().to_rfc3339()],
                )?;
            }
        }

        tx.commit()?;

        Ok(MigrationOutcome { previous, current: CURRENT_SCHEMA_VERSION })
    })
    .await
    .map_err(Error::from)
}
