//! session_create tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use squirrel_core::ArchiveController;

use super::json_result;

/// Parameters for the session_create tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SessionCreateParams {
    /// Optional display name for the session.
    #[serde(default)]
    pub name: Option<String>,
}

/// Output from the session_create tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionCreateOutput {
    pub session_id: i64,
}

/// Implementation of the session_create tool.
pub async fn create_impl(
    controller: &ArchiveController, params: SessionCreateParams,
) -> Result<CallToolResult, McpError> {
    let name = params.name.filter(|n| !n.trim().is_empty());
    let session_id = controller.create_named_session(name).await?;
    json_result(&SessionCreateOutput { session_id })
}
