//! tab_create and tab_delete tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use squirrel_core::ArchiveController;

use super::json_result;

/// Parameters for the tab_create tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TabCreateParams {
    /// The tab URL.
    pub url: String,

    /// The tab title.
    pub title: String,

    /// Session to file the tab under.
    pub session_id: i64,
}

/// Output from the tab_create tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TabCreateOutput {
    pub tab_id: i64,
}

/// Parameters for the tab_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TabDeleteParams {
    /// Id of the tab to delete.
    pub id: i64,
}

/// Output from the tab_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TabDeleteOutput {
    pub deleted: i64,
}

/// Implementation of the tab_create tool.
pub async fn create_impl(controller: &ArchiveController, params: TabCreateParams) -> Result<CallToolResult, McpError> {
    let tab_id = controller
        .create_tab(&params.url, &params.title, params.session_id)
        .await?;
    json_result(&TabCreateOutput { tab_id })
}

/// Implementation of the tab_delete tool.
pub async fn delete_impl(controller: &ArchiveController, params: TabDeleteParams) -> Result<CallToolResult, McpError> {
    controller.delete_tab(params.id).await?;
    json_result(&TabDeleteOutput { deleted: params.id })
}
