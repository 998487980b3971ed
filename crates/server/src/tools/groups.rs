//! group_delete tool implementation.
//!
//! Removes the listed tabs and then the group (a session or a domain) in one
//! transaction. If the group still has tabs that were not listed, nothing is
//! deleted and a store error is returned.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use squirrel_core::ArchiveController;
use squirrel_core::store::{DeleteGroup, GroupId, GroupingMode};

use super::json_result;

/// Parameters for the group_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GroupDeleteParams {
    /// `session` or `domain`.
    #[serde(default)]
    pub grouping: GroupingMode,

    /// Session id, or domain name when grouping by domain.
    pub id: GroupId,

    /// Tabs in the group to delete along with it. Unknown ids are ignored.
    #[serde(default)]
    pub tab_ids: Vec<i64>,
}

/// Output from the group_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GroupDeleteOutput {
    /// Tabs actually removed.
    pub deleted_tabs: usize,
}

/// Implementation of the group_delete tool.
pub async fn delete_impl(controller: &ArchiveController, params: GroupDeleteParams) -> Result<CallToolResult, McpError> {
    let deleted_tabs = controller
        .delete_group(DeleteGroup { grouping: params.grouping, id: params.id, tab_ids: params.tab_ids })
        .await?;
    json_result(&GroupDeleteOutput { deleted_tabs })
}
