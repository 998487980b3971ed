//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{
    ArchiveGetParams, ArchiveSaveParams, GroupDeleteParams, SessionCreateParams, TabCreateParams, TabDeleteParams,
    archive, groups, sessions, tabs,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use squirrel_core::ArchiveController;

/// The main MCP server handler for squirrel.
#[derive(Clone)]
pub struct SquirrelServer {
    controller: Arc<ArchiveController>,
    allow_duplicate_urls: bool,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SquirrelServer {
    /// Create a new server handler.
    ///
    /// `allow_duplicate_urls` is the default for archive_save calls that do
    /// not set it.
    pub fn new(controller: Arc<ArchiveController>, allow_duplicate_urls: bool) -> Self {
        Self { controller, allow_duplicate_urls, tool_router: Self::tool_router() }
    }

    #[tool(description = "Read the tab archive: sessions newest first, each with its tabs (newest first) and favicons.")]
    async fn archive_get(&self, params: Parameters<ArchiveGetParams>) -> Result<CallToolResult, McpError> {
        archive::get_impl(&self.controller, params.0).await
    }

    #[tool(
        description = "Archive a list of open tabs into a new session, or into session_id if given. Duplicate URLs are dropped unless allow_duplicate_urls is true."
    )]
    async fn archive_save(&self, params: Parameters<ArchiveSaveParams>) -> Result<CallToolResult, McpError> {
        archive::save_impl(&self.controller, self.allow_duplicate_urls, params.0).await
    }

    #[tool(description = "Delete every tab, session and domain from the archive.")]
    async fn archive_delete_all(&self) -> Result<CallToolResult, McpError> {
        archive::delete_all_impl(&self.controller).await
    }

    #[tool(description = "Create an empty session, optionally named. Returns its id.")]
    async fn session_create(&self, params: Parameters<SessionCreateParams>) -> Result<CallToolResult, McpError> {
        sessions::create_impl(&self.controller, params.0).await
    }

    #[tool(description = "Archive a single tab under an existing session. Returns the tab id.")]
    async fn tab_create(&self, params: Parameters<TabCreateParams>) -> Result<CallToolResult, McpError> {
        tabs::create_impl(&self.controller, params.0).await
    }

    #[tool(description = "Delete one archived tab by id.")]
    async fn tab_delete(&self, params: Parameters<TabDeleteParams>) -> Result<CallToolResult, McpError> {
        tabs::delete_impl(&self.controller, params.0).await
    }

    #[tool(
        description = "Delete a session or domain group together with the listed tabs. Fails without changes if the group has other tabs."
    )]
    async fn group_delete(&self, params: Parameters<GroupDeleteParams>) -> Result<CallToolResult, McpError> {
        groups::delete_impl(&self.controller, params.0).await
    }
}

impl ServerHandler for SquirrelServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "squirrel".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::controller;

    #[test]
    fn test_tools_registered() {
        let server = SquirrelServer::new(controller(), false);
        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "archive_delete_all",
                "archive_get",
                "archive_save",
                "group_delete",
                "session_create",
                "tab_create",
                "tab_delete",
            ]
        );
    }

    #[test]
    fn test_server_info() {
        let info = SquirrelServer::new(controller(), false).get_info();
        assert_eq!(info.server_info.name, "squirrel");
    }
}
