/// MCP Server setup using `rmcp` with stdio transport.
///
/// Serves the struct, member and use listings of one read-only record store
/// to a single client. Provides `McpContext` (shared state) and `McpServer`
/// (startup logic).
use crate::mcp::tools::AppTools;
use anyhow::{Context, Result};
use rmcp::{ServiceExt, handler::server::router::Router, transport::io::stdio};
use std::sync::Arc;

use crate::{config::Config, db::Db};
use tokio::sync::Mutex as TokioMutex;

/// Shared application context available to all tool handlers. Page sizes
/// come from `config.listing`.
#[derive(Clone)]
pub struct McpContext {
    pub db: Arc<TokioMutex<Db>>,
    pub config: Arc<Config>,
}

/// MCP Server wrapping the context and serving via stdio.
#[derive(Clone)]
pub struct McpServer {
    pub ctx: McpContext,
}

impl McpServer {
    pub fn new(ctx: McpContext) -> Self {
        Self { ctx }
    }

    /// Start the MCP server on stdio transport (blocks until the client disconnects).
    pub async fn start(self) -> Result<()> {
        tracing::info!("Starting MCP server on stdio...");
        let (stdin, stdout) = stdio();

        let app_tools = AppTools::new(self.ctx.clone());
        let router = Router::new(app_tools.clone()).with_tools(app_tools.tool_router.clone());

        let service = router
            .serve((stdin, stdout))
            .await
            .context("MCP Server failed to initialize stdio transport")?;
        service
            .waiting()
            .await
            .context("MCP Server encountered an error during stdio transport")?;

        Ok(())
    }
}
