//! Session operations.

use super::{Page, Query, Session, TabStore};
use crate::Error;

impl TabStore {
    /// Create a session stamped with the current time and return its id.
    pub async fn create_session(&self) -> Result<i64, Error> {
        self.create_named_session(None).await
    }

    /// Create a session with an optional display name.
    ///
    /// The insert and the id read-back share one immediate transaction, so
    /// no concurrent writer can slip a newer session in between.
    pub async fn create_named_session(&self, name: Option<String>) -> Result<i64, Error> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let id = self
            .exec
            .transaction(move |ex| {
                ex.execute(
                    &Query::new("INSERT INTO sessions (timestamp, name) VALUES (:timestamp, :name)")
                        .bind("timestamp", timestamp)
                        .bind("name", name),
                )?;
                ex.scalar::<i64>(&Query::new("SELECT MAX(id) FROM sessions"))?
                    .ok_or_else(|| Error::NotFound("session id after insert".into()))
            })
            .await?;

        tracing::debug!(session_id = id, "session created");
        Ok(id)
    }

    /// Sessions newest first, windowed by `page`.
    pub async fn get_sessions(&self, page: Page) -> Result<Vec<Session>, Error> {
        let query = Query::new("SELECT id, timestamp, name FROM sessions ORDER BY id DESC LIMIT :limit OFFSET :offset")
            .bind("limit", if page.limit < 0 { -1 } else { page.limit })
            .bind("offset", page.offset.max(0));

        self.exec
            .run(move |ex| {
                let mut sessions = Vec::new();
                let mut failure = None;
                ex.for_each(&query, |record| match Session::try_from(&record) {
                    Ok(session) => sessions.push(session),
                    Err(e) => {
                        failure.get_or_insert(e);
                    }
                })?;
                match failure {
                    Some(e) => Err(e),
                    None => Ok(sessions),
                }
            })
            .await
    }

    /// Delete one session. Its tabs must already be gone.
    pub async fn delete_session(&self, id: i64) -> Result<(), Error> {
        self.exec
            .execute(Query::new("DELETE FROM sessions WHERE id = :id").bind("id", id))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::store::{ArchiveDb, Page, TabStore};

    async fn store() -> TabStore {
        TabStore::new(&ArchiveDb::open_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_session_create_delete() {
        let store = store().await;
        let id = store.create_session().await.unwrap();

        let sessions = store.get_sessions(Page::default()).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, id);
        assert!(sessions[0].timestamp > 0);
        assert!(sessions[0].name.is_none());

        store.delete_session(id).await.unwrap();
        assert!(store.get_sessions(Page::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_sessions_pagination() {
        let store = store().await;
        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(store.create_session().await.unwrap());
        }

        let all = store.get_sessions(Page::default()).await.unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].id, ids[4], "newest session first");

        let limited = store.get_sessions(Page::new(1, 0)).await.unwrap();
        assert_eq!(limited.len(), 1);

        let offset = store.get_sessions(Page::new(-1, 1)).await.unwrap();
        assert_eq!(offset.len(), 4);

        let window = store.get_sessions(Page::new(1, 1)).await.unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].id, ids[3], "second most recent session");
    }

    #[tokio::test]
    async fn test_named_session() {
        let store = store().await;
        let id = store.create_named_session(Some("reading list".into())).await.unwrap();
        let sessions = store.get_sessions(Page::default()).await.unwrap();
        assert_eq!(sessions[0].id, id);
        assert_eq!(sessions[0].name.as_deref(), Some("reading list"));
    }

    #[tokio::test]
    async fn test_concurrent_session_ids_are_distinct() {
        let store = store().await;
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.create_session().await.unwrap() }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }

    #[tokio::test]
    async fn test_delete_session_with_tabs_fails() {
        let store = store().await;
        let id = store.create_session().await.unwrap();
        store.create_tab("https://example.com", "Example", id).await.unwrap();

        assert!(store.delete_session(id).await.is_err());
        assert_eq!(store.get_sessions(Page::default()).await.unwrap().len(), 1);
    }
}
