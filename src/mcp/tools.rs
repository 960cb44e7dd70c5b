/// MCP Tool handlers for structscope.
///
/// 1. list_structs – struct and union declarations
/// 2. list_members – members with their use counters
/// 3. list_uses    – individual member accesses
/// 4. show_struct  – one struct with nested members resolved
/// 5. show_member  – one member with a page of its uses
/// 6. list_runs    – scan runs recorded in the store
use crate::error::BrowseError;
use crate::listing::ListingParams;
use crate::mcp::server::McpContext;
use rmcp::handler::server::ServerHandler;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{ErrorData as McpError, handler::server::tool::ToolRouter, model::*, tool, tool_router};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ── Parameter structs ────────────────────────────────────────────────

#[derive(Deserialize, JsonSchema)]
struct DetailParams {
    /// Record id
    id: i64,
    /// Listing parameters applied to the detail view
    #[serde(flatten)]
    params: ListingParams,
}

// ── Response helpers ─────────────────────────────────────────────────

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("serialization failed: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn error_result(msg: &str) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg.to_string())]))
}

/// Unknown ids are reported to the caller; store failures are protocol errors.
fn browse_result<T: Serialize>(
    what: &str,
    result: Result<T, BrowseError>,
) -> Result<CallToolResult, McpError> {
    match result {
        Ok(value) => json_result(&value),
        Err(e @ BrowseError::NotFound { .. }) => error_result(&e.to_string()),
        Err(e) => {
            tracing::error!("{what} failed: {e}");
            Err(McpError::internal_error(format!("{what} failed: {e}"), None))
        }
    }
}

// ── Tool implementations ─────────────────────────────────────────────

#[derive(Clone)]
pub struct AppTools {
    pub ctx: McpContext,
    pub tool_router: ToolRouter<Self>,
}

impl ServerHandler for AppTools {}

#[tool_router]
impl AppTools {
    pub fn new(ctx: McpContext) -> Self {
        Self {
            ctx,
            tool_router: Self::tool_router(),
        }
    }

    // ── Tool 1: list_structs ────────────────────────────────────────

    #[tool(
        description = "List struct and union declarations. Filters: filter, filter_file, noreserved, nopacked, nomacro, run. Sort keys: name | file | line | type. Paged; total_count is 'many' when the result is large."
    )]
    async fn list_structs(
        &self,
        params: Parameters<ListingParams>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0.structs();
        let limit = self.ctx.config.listing.structs;

        let db = self.ctx.db.lock().await;
        browse_result("list_structs", db.list_structs(&req, limit))
    }

    // ── Tool 2: list_members ────────────────────────────────────────

    #[tool(
        description = "List struct members with use/load/store counters. Filters: filter, filter_struct, filter_member, filter_file, unused, noimplicit, noreserved, nopacked, nomacro, run. Sort keys: struct | member | file | uses | implicit_uses."
    )]
    async fn list_members(
        &self,
        params: Parameters<ListingParams>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0.members();
        let limit = self.ctx.config.listing.members;

        let db = self.ctx.db.lock().await;
        browse_result("list_members", db.list_members(&req, limit))
    }

    // ── Tool 3: list_uses ───────────────────────────────────────────

    #[tool(
        description = "List accesses to struct members. Filters: filter, filter_struct, filter_member, filter_file, access (load | store | unknown), noimplicit, member, run. Sort keys: file | struct | member | line."
    )]
    async fn list_uses(
        &self,
        params: Parameters<ListingParams>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0.uses();
        let limit = self.ctx.config.listing.uses;

        let db = self.ctx.db.lock().await;
        browse_result("list_uses", db.list_uses(&req, limit))
    }

    // ── Tool 4: show_struct ─────────────────────────────────────────

    #[tool(
        description = "Show one struct with its members. Members of anonymous nested structs and unions are included with their nesting level. Optional filters: unused, noimplicit, noreserved."
    )]
    async fn show_struct(
        &self,
        params: Parameters<DetailParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let filter = p.params.detail_filter();

        let db = self.ctx.db.lock().await;
        browse_result("show_struct", db.show_struct(p.id, filter))
    }

    // ── Tool 5: show_member ─────────────────────────────────────────

    #[tool(
        description = "Show one member with a page of its uses. Accepts the list_uses filters and sort keys."
    )]
    async fn show_member(
        &self,
        params: Parameters<DetailParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let req = p.params.uses();
        let limit = self.ctx.config.listing.uses;

        let db = self.ctx.db.lock().await;
        browse_result("show_member", db.show_member(p.id, &req, limit))
    }

    // ── Tool 6: list_runs ───────────────────────────────────────────

    #[tool(description = "List scan runs recorded in the store, newest first")]
    async fn list_runs(&self) -> Result<CallToolResult, McpError> {
        let db = self.ctx.db.lock().await;
        browse_result("list_runs", db.list_runs())
    }
}
