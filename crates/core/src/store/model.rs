//! Archive entities and the read model returned to callers.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::query::Record;
use crate::Error;

/// One archival event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Session {
    pub id: i64,
    /// Milliseconds since the Unix epoch, set at creation.
    pub timestamp: i64,
    pub name: Option<String>,
}

impl TryFrom<&Record> for Session {
    type Error = Error;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        Ok(Session { id: record.get("id")?, timestamp: record.get("timestamp")?, name: record.get("name")? })
    }
}

/// Effective top-level domain shared by archived tabs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Domain {
    pub id: i64,
    pub name: String,
}

impl TryFrom<&Record> for Domain {
    type Error = Error;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        Ok(Domain { id: record.get("id")?, name: record.get("name")? })
    }
}

/// A stored tab. Favicons are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub session_id: i64,
    pub domain_id: i64,
}

impl TryFrom<&Record> for Tab {
    type Error = Error;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        Ok(Tab {
            id: record.get("id")?,
            url: record.get("url")?,
            title: record.get("title")?,
            session_id: record.get("session_id")?,
            domain_id: record.get("domain_id")?,
        })
    }
}

/// A tab with its favicon resolved at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedTab {
    #[serde(flatten)]
    pub tab: Tab,
    pub favicon: String,
}

/// How an archive view or a group deletion is organized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum GroupingMode {
    #[default]
    Session,
    Domain,
}

/// Read model returned by the archive controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveView {
    pub groups: Vec<Session>,
    pub tabs: IndexMap<i64, Vec<ArchivedTab>>,
    pub grouping_mode: GroupingMode,
}

/// Pagination window for session listings.
///
/// A negative `limit` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Page {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    -1
}

impl Default for Page {
    fn default() -> Self {
        Self { limit: default_limit(), offset: 0 }
    }
}

impl Page {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }
}

/// Identifier of a group: a session id or a domain name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum GroupId {
    Id(i64),
    Name(String),
}

/// Request to delete a group of tabs along with the group itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DeleteGroup {
    pub grouping: GroupingMode,
    pub id: GroupId,
    #[serde(default)]
    pub tab_ids: Vec<i64>,
}

/// A resolved group reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupRef {
    Session(i64),
    Domain(String),
}

impl TryFrom<&DeleteGroup> for GroupRef {
    type Error = Error;

    fn try_from(request: &DeleteGroup) -> Result<Self, Self::Error> {
        match (request.grouping, &request.id) {
            (GroupingMode::Session, GroupId::Id(id)) => Ok(GroupRef::Session(*id)),
            (GroupingMode::Session, GroupId::Name(raw)) => raw
                .parse()
                .map(GroupRef::Session)
                .map_err(|_| Error::InvalidInput(format!("session group id must be numeric, got {raw:?}"))),
            (GroupingMode::Domain, GroupId::Name(name)) => Ok(GroupRef::Domain(name.clone())),
            (GroupingMode::Domain, GroupId::Id(id)) => {
                Err(Error::InvalidInput(format!("domain group id must be a domain name, got {id}")))
            }
        }
    }
}
