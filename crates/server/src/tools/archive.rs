//! archive_get, archive_save and archive_delete_all tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use squirrel_core::store::Page;
use squirrel_core::{ArchiveController, TabEntry, TabList, TabListOptions};

use super::json_result;

/// Parameters for the archive_get tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ArchiveGetParams {
    /// Maximum number of sessions to return (newest first). Omit for all.
    #[serde(default)]
    pub limit: Option<i64>,

    /// Number of newest sessions to skip.
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Parameters for the archive_save tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ArchiveSaveParams {
    /// Tabs to archive, in order.
    pub tabs: Vec<TabEntry>,

    /// Existing session to add the tabs to. A new session is created if omitted.
    #[serde(default)]
    pub session_id: Option<i64>,

    /// Keep repeated URLs. Defaults to the server configuration.
    #[serde(default)]
    pub allow_duplicate_urls: Option<bool>,
}

/// Output from the archive_save tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ArchiveSaveOutput {
    /// Session the tabs were saved into.
    pub session_id: i64,

    /// New tab ids, in input order.
    pub tab_ids: Vec<i64>,

    /// Number of tabs dropped as duplicate URLs.
    pub skipped_duplicates: usize,
}

/// Output from the archive_delete_all tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ArchiveDeleteAllOutput {
    pub deleted: bool,
}

/// Implementation of the archive_get tool.
pub async fn get_impl(controller: &ArchiveController, params: ArchiveGetParams) -> Result<CallToolResult, McpError> {
    let page = Page::new(params.limit.unwrap_or(-1), params.offset.unwrap_or(0).max(0));
    let view = controller.get_archive_page(page).await?;
    json_result(&view)
}

/// Implementation of the archive_save tool.
pub async fn save_impl(
    controller: &ArchiveController, default_allow_duplicates: bool, params: ArchiveSaveParams,
) -> Result<CallToolResult, McpError> {
    let requested = params.tabs.len();
    let options = TabListOptions {
        session_id: params.session_id,
        allow_duplicate_urls: params.allow_duplicate_urls.unwrap_or(default_allow_duplicates),
    };
    let list = TabList::from_entries(options, params.tabs);
    let skipped_duplicates = requested - list.len();

    let saved = controller.save_tab_list(list).await?;
    json_result(&ArchiveSaveOutput { session_id: saved.session_id, tab_ids: saved.tab_ids, skipped_duplicates })
}

/// Implementation of the archive_delete_all tool.
pub async fn delete_all_impl(controller: &ArchiveController) -> Result<CallToolResult, McpError> {
    controller.delete_all().await?;
    json_result(&ArchiveDeleteAllOutput { deleted: true })
}
