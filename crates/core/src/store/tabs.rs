//! Tab operations.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::domain_name::effective_domain;
use super::domains::resolve_domain;
use super::{Executor, Query, Tab, TabStore};
use crate::Error;

/// A tab ready for insertion, with its effective domain already computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTab {
    pub url: String,
    pub title: String,
    pub domain: String,
}

impl NewTab {
    /// Validate `url` and derive its domain.
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Result<Self, Error> {
        let url = url.into();
        let domain = effective_domain(&url)?;
        Ok(Self { url, title: title.into(), domain })
    }
}

fn insert_tab(ex: &Executor<'_>, session_id: i64, domain_id: i64, url: &str, title: &str) -> Result<i64, Error> {
    ex.execute(
        &Query::new(
            "INSERT INTO tabs (session_id, domain_id, url, title) VALUES (:session_id, :domain_id, :url, :title)",
        )
        .bind("session_id", session_id)
        .bind("domain_id", domain_id)
        .bind("url", url.to_string())
        .bind("title", title.to_string()),
    )?;
    ex.scalar::<i64>(&Query::new("SELECT MAX(id) FROM tabs"))?
        .ok_or_else(|| Error::NotFound("tab id after insert".into()))
}

pub(crate) fn delete_tabs_in(ex: &Executor<'_>, ids: &[i64]) -> Result<usize, Error> {
    if ids.is_empty() {
        return Ok(0);
    }
    ex.execute(&Query::new("DELETE FROM tabs WHERE id IN (:ids)").bind_list("ids", ids.to_vec()))
}

impl TabStore {
    /// Archive one tab under `session_id`, creating its domain if needed.
    ///
    /// Domain resolution and the tab insert share one transaction. Returns the
    /// new tab id.
    pub async fn create_tab(&self, url: &str, title: &str, session_id: i64) -> Result<i64, Error> {
        let domain = effective_domain(url)?;
        let url = url.to_string();
        let title = title.to_string();

        self.exec
            .transaction(move |ex| {
                let domain_id = resolve_domain(ex, &domain)?;
                insert_tab(ex, session_id, domain_id, &url, &title)
            })
            .await
    }

    /// Insert tabs in order, creating a session first when `session_id` is
    /// `None`.
    ///
    /// Domains are resolved, the session is created and every tab is
    /// inserted in one transaction; on failure no session, domain or tab from
    /// this call remains. Returns the session id and the tab ids in input
    /// order.
    pub async fn insert_tabs(&self, session_id: Option<i64>, tabs: Vec<NewTab>) -> Result<(i64, Vec<i64>), Error> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        self.exec
            .transaction(move |ex| {
                let session_id = match session_id {
                    Some(id) => ex
                        .scalar::<i64>(&Query::new("SELECT id FROM sessions WHERE id = :id").bind("id", id))?
                        .ok_or_else(|| Error::NotFound(format!("session {id}")))?,
                    None => {
                        ex.execute(
                            &Query::new("INSERT INTO sessions (timestamp, name) VALUES (:timestamp, NULL)")
                                .bind("timestamp", timestamp),
                        )?;
                        ex.scalar::<i64>(&Query::new("SELECT MAX(id) FROM sessions"))?
                            .ok_or_else(|| Error::NotFound("session id after insert".into()))?
                    }
                };

                let mut domain_ids: HashMap<&str, i64> = HashMap::new();
                let mut ids = Vec::with_capacity(tabs.len());
                for tab in &tabs {
                    let domain_id = match domain_ids.get(tab.domain.as_str()) {
                        Some(id) => *id,
                        None => {
                            let id = resolve_domain(ex, &tab.domain)?;
                            domain_ids.insert(&tab.domain, id);
                            id
                        }
                    };
                    ids.push(insert_tab(ex, session_id, domain_id, &tab.url, &tab.title)?);
                }
                Ok((session_id, ids))
            })
            .await
    }

    /// Tabs grouped by session, newest tab first within each group.
    ///
    /// Every requested id is present in the result, with an empty list when
    /// the session has no tabs. Keys keep the order of `session_ids`.
    pub async fn get_tabs_for_sessions(&self, session_ids: &[i64]) -> Result<IndexMap<i64, Vec<Tab>>, Error> {
        let mut grouped: IndexMap<i64, Vec<Tab>> = session_ids.iter().map(|id| (*id, Vec::new())).collect();
        if session_ids.is_empty() {
            return Ok(grouped);
        }

        let query = Query::new(
            "SELECT id, url, title, session_id, domain_id FROM tabs WHERE session_id IN (:session_ids) ORDER BY id DESC",
        )
        .bind_list("session_ids", session_ids.to_vec());

        for record in self.exec.rows(query).await? {
            let tab = Tab::try_from(&record)?;
            grouped.entry(tab.session_id).or_default().push(tab);
        }

        Ok(grouped)
    }

    /// Delete tabs by id. Unknown ids are ignored.
    pub async fn delete_tabs(&self, ids: &[i64]) -> Result<usize, Error> {
        let ids = ids.to_vec();
        self.exec.run(move |ex| delete_tabs_in(ex, &ids)).await
    }

    pub async fn delete_tab(&self, id: i64) -> Result<(), Error> {
        self.delete_tabs(&[id]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::Error;
    use crate::store::{ArchiveDb, NewTab, Page, Query, TabStore};

    async fn store() -> TabStore {
        TabStore::new(&ArchiveDb::open_in_memory().await.unwrap())
    }

    const SESSION_ONE: &[(&str, &str)] = &[
        ("https://mail.mozilla.org/zimbra", "Mozilla Mail"),
        ("https://developer.mozilla.org/", "Mozilla Developer Network"),
        ("https://www.reddit.com/", "The front page of the web"),
        ("https://www.techmeme.com/", "Techmeme"),
    ];

    const SESSION_TWO: &[(&str, &str)] = &[
        ("https://www.techcrunch.com/", "The latest technology news and information on startups"),
        ("https://news.ycombinator.com/", "Hacker News"),
    ];

    #[tokio::test]
    async fn test_create_tab_roundtrip() {
        let store = store().await;
        let session = store.create_session().await.unwrap();
        let id = store.create_tab("http://example.com", "I am an Example!", session).await.unwrap();

        let tabs = store.get_tabs_for_sessions(&[session]).await.unwrap();
        assert_eq!(tabs[&session].len(), 1);
        let tab = &tabs[&session][0];
        assert_eq!(tab.id, id);
        assert_eq!(tab.url, "http://example.com");
        assert_eq!(tab.title, "I am an Example!");
        assert_eq!(tab.session_id, session);

        let domain = store.get_domain_by_name("example.com").await.unwrap().unwrap();
        assert_eq!(tab.domain_id, domain.id);
    }

    #[tokio::test]
    async fn test_tabs_grouped_by_session() {
        let store = store().await;
        let first = store.create_session().await.unwrap();
        for (url, title) in SESSION_ONE {
            store.create_tab(url, title, first).await.unwrap();
        }
        let second = store.create_session().await.unwrap();
        for (url, title) in SESSION_TWO {
            store.create_tab(url, title, second).await.unwrap();
        }

        let tabs = store.get_tabs_for_sessions(&[first]).await.unwrap();
        assert_eq!(tabs[&first].len(), SESSION_ONE.len());

        let tabs = store.get_tabs_for_sessions(&[first, second]).await.unwrap();
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs[&second].len(), SESSION_TWO.len());
        assert_eq!(tabs.keys().copied().collect::<Vec<_>>(), vec![first, second]);
    }

    #[tokio::test]
    async fn test_tabs_newest_first_within_group() {
        let store = store().await;
        let session = store.create_session().await.unwrap();
        for (url, title) in SESSION_ONE {
            store.create_tab(url, title, session).await.unwrap();
        }

        let tabs = store.get_tabs_for_sessions(&[session]).await.unwrap();
        let urls: Vec<&str> = tabs[&session].iter().map(|t| t.url.as_str()).collect();
        let mut expected: Vec<&str> = SESSION_ONE.iter().map(|(url, _)| *url).collect();
        expected.reverse();
        assert_eq!(urls, expected);
    }

    #[tokio::test]
    async fn test_missing_sessions_have_empty_groups() {
        let store = store().await;
        let tabs = store.get_tabs_for_sessions(&[41, 42]).await.unwrap();
        assert_eq!(tabs.len(), 2);
        assert!(tabs[&41].is_empty());
        assert!(tabs[&42].is_empty());

        assert!(store.get_tabs_for_sessions(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tab_delete() {
        let store = store().await;
        let session = store.create_session().await.unwrap();
        for (url, title) in SESSION_ONE {
            store.create_tab(url, title, session).await.unwrap();
        }

        let tabs = store.get_tabs_for_sessions(&[session]).await.unwrap();
        store.delete_tab(tabs[&session][0].id).await.unwrap();

        let tabs = store.get_tabs_for_sessions(&[session]).await.unwrap();
        assert_eq!(tabs[&session].len(), SESSION_ONE.len() - 1);
    }

    #[tokio::test]
    async fn test_delete_tabs_many_and_empty() {
        let store = store().await;
        let session = store.create_session().await.unwrap();
        let a = store.create_tab("https://a.com", "A", session).await.unwrap();
        let b = store.create_tab("https://b.com", "B", session).await.unwrap();
        store.create_tab("https://c.com", "C", session).await.unwrap();

        assert_eq!(store.delete_tabs(&[]).await.unwrap(), 0);
        assert_eq!(store.delete_tabs(&[a, b, 9999]).await.unwrap(), 2);

        let tabs = store.get_tabs_for_sessions(&[session]).await.unwrap();
        assert_eq!(tabs[&session].len(), 1);
    }

    #[tokio::test]
    async fn test_create_tab_unknown_session_fails() {
        let store = store().await;
        let result = store.create_tab("https://example.com", "Example", 777).await;
        assert!(matches!(result, Err(Error::Database(_))));
        // The domain resolved in the failed transaction is rolled back too.
        assert!(store.get_domain_by_name("example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_tab_invalid_url() {
        let store = store().await;
        let session = store.create_session().await.unwrap();
        let result = store.create_tab("not a url", "Broken", session).await;
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_tabs_share_domain() {
        let store = store().await;
        let session = store.create_session().await.unwrap();
        store.create_tab("https://mail.mozilla.org/", "Mail", session).await.unwrap();
        store.create_tab("https://developer.mozilla.org/", "MDN", session).await.unwrap();

        let tabs = store.get_tabs_for_sessions(&[session]).await.unwrap();
        assert_eq!(tabs[&session][0].domain_id, tabs[&session][1].domain_id);
    }

    #[tokio::test]
    async fn test_insert_tabs_creates_session_and_keeps_order() {
        let store = store().await;
        let (session, ids) = store
            .insert_tabs(
                None,
                vec![
                    NewTab::new("https://a.com", "A").unwrap(),
                    NewTab::new("https://b.com", "B").unwrap(),
                    NewTab::new("https://www.a.com/x", "A2").unwrap(),
                ],
            )
            .await
            .unwrap();

        assert_eq!(ids.len(), 3);
        assert!(ids[0] < ids[1] && ids[1] < ids[2]);
        let sessions = store.get_sessions(Page::default()).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, session);

        let tabs = store.get_tabs_for_sessions(&[session]).await.unwrap();
        assert_eq!(tabs[&session][0].domain_id, tabs[&session][2].domain_id);
        assert!(store.get_domain_by_name("b.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_insert_tabs_unknown_session_fails() {
        let store = store().await;
        let result = store.insert_tabs(Some(999), vec![NewTab::new("https://a.com", "A").unwrap()]).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(store.get_domain_by_name("a.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_tabs_failure_rolls_back_domains_and_session() {
        let store = store().await;
        store
            .executor()
            .execute(Query::new(
                "CREATE TRIGGER reject_tab BEFORE INSERT ON tabs WHEN NEW.title = 'reject' \
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END",
            ))
            .await
            .unwrap();

        let result = store
            .insert_tabs(
                None,
                vec![NewTab::new("https://a.com", "A").unwrap(), NewTab::new("https://b.com", "reject").unwrap()],
            )
            .await;

        assert!(matches!(result, Err(Error::Database(_))));
        assert!(store.get_sessions(Page::default()).await.unwrap().is_empty());
        assert!(store.get_domain_by_name("a.com").await.unwrap().is_none());
        assert!(store.get_domain_by_name("b.com").await.unwrap().is_none());
    }

    #[test]
    fn test_new_tab_rejects_invalid_url() {
        assert!(matches!(NewTab::new("not a url", "Broken"), Err(Error::InvalidUrl(_))));
        assert_eq!(NewTab::new("https://mail.mozilla.org/", "Mail").unwrap().domain, "mozilla.org");
    }
}
