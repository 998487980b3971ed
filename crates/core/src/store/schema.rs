//! Lifecycle of the single archive connection.
//!
//! The [`SchemaManager`] opens the archive at most once. The first caller of
//! [`SchemaManager::ready`] starts the open on a background task; every caller,
//! including later ones, waits on the same broadcast state and observes the
//! same outcome. A failed open is terminal for the manager.
//!
//! ```text
//! Uninitialized -> Opening -> Ready | Failed
//! Ready -> Closed
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use super::connection::{ArchiveDb, DbLocation};
use crate::Error;

/// Observable state of the archive connection.
#[derive(Debug, Clone)]
pub enum ConnectionState {
    Uninitialized,
    Opening,
    Ready(ArchiveDb),
    Failed(String),
    Closed,
}

impl ConnectionState {
    fn is_settled(&self) -> bool {
        !matches!(self, ConnectionState::Uninitialized | ConnectionState::Opening)
    }
}

/// Owner of the shared archive connection.
#[derive(Debug)]
pub struct SchemaManager {
    location: DbLocation,
    statement_cache_capacity: usize,
    state: Arc<watch::Sender<ConnectionState>>,
    teardown_registered: AtomicBool,
}

impl SchemaManager {
    pub fn new(location: DbLocation, statement_cache_capacity: usize) -> Self {
        let (state, _) = watch::channel(ConnectionState::Uninitialized);
        Self { location, statement_cache_capacity, state: Arc::new(state), teardown_registered: AtomicBool::new(false) }
    }

    /// Current state snapshot.
    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    /// Wait until the archive is open and return a handle to it.
    ///
    /// The open runs once per manager; concurrent and later callers share its
    /// result. After a failure every call returns `Error::NotReady`.
    pub async fn ready(&self) -> Result<ArchiveDb, Error> {
        let mut rx = self.state.subscribe();

        let start = self.state.send_if_modified(|state| {
            if matches!(state, ConnectionState::Uninitialized) {
                *state = ConnectionState::Opening;
                true
            } else {
                false
            }
        });

        if start {
            self.spawn_open();
        }

        let settled = rx
            .wait_for(ConnectionState::is_settled)
            .await
            .map_err(|_| Error::NotReady("schema manager dropped".into()))?;

        match &*settled {
            ConnectionState::Ready(db) => Ok(db.clone()),
            ConnectionState::Failed(reason) => Err(Error::NotReady(reason.clone())),
            _ => Err(Error::NotReady("archive connection closed".into())),
        }
    }

    fn spawn_open(&self) {
        let state = Arc::clone(&self.state);
        let location = self.location.clone();
        let capacity = self.statement_cache_capacity;

        tokio::spawn(async move {
            tracing::debug!(?location, "opening archive");
            let next = match ArchiveDb::connect(&location, capacity).await {
                Ok(db) => {
                    tracing::info!(
                        ?location,
                        schema_version = db.schema_version(),
                        migrated = db.is_migrated(),
                        "archive ready"
                    );
                    ConnectionState::Ready(db)
                }
                Err(e) => {
                    tracing::error!(?location, error = %e, "archive failed to open");
                    ConnectionState::Failed(e.to_string())
                }
            };

            let mut orphan = None;
            state.send_modify(|current| {
                if matches!(current, ConnectionState::Closed) {
                    if let ConnectionState::Ready(db) = next {
                        orphan = Some(db);
                    }
                } else {
                    *current = next;
                }
            });

            // Closed while opening: release the connection nobody will use.
            if let Some(db) = orphan
                && let Err(e) = db.close().await
            {
                tracing::warn!(error = %e, "failed to close archive opened after shutdown");
            }
        });
    }

    /// Close the connection. Only the first call does any work.
    pub async fn close(&self) -> Result<(), Error> {
        match self.state.send_replace(ConnectionState::Closed) {
            ConnectionState::Ready(db) => {
                db.close().await?;
                tracing::info!("archive connection closed");
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Register a one-time teardown: close the connection when `signal`
    /// completes.
    ///
    /// Returns `false` if a teardown hook was already registered.
    pub fn close_on<F>(self: &Arc<Self>, signal: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.teardown_registered.swap(true, Ordering::SeqCst) {
            return false;
        }

        let manager = Arc::clone(self);
        tokio::spawn(async move {
            signal.await;
            tracing::info!("shutdown signalled, closing archive");
            if let Err(e) = manager.close().await {
                tracing::warn!(error = %e, "failed to close archive on shutdown");
            }
        });
        true
    }
}
