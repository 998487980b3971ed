//! MCP tool implementations.
//!
//! This module contains all tools exposed by the squirrel server.

pub mod archive;
pub mod groups;
pub mod sessions;
pub mod tabs;

pub use archive::{ArchiveGetParams, ArchiveSaveParams};
pub use groups::GroupDeleteParams;
pub use sessions::SessionCreateParams;
pub use tabs::{TabCreateParams, TabDeleteParams};

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use squirrel_core::Error;

/// Render `output` as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
