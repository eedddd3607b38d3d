//! Search tool.

use schemars::JsonSchema;
use serde::Deserialize;

use crate::context::RequestContext;
use crate::protocol::CallToolResult;
use crate::tool::{Tool, ToolBuilder};

#[derive(Debug, Deserialize, JsonSchema)]
struct SearchInput {
    /// Search query.
    query: String,
    /// Maximum number of results to return.
    #[serde(default)]
    limit: Option<u32>,
}

/// `depot_search`: full-text search across the caller's content.
pub fn search() -> Tool {
    ToolBuilder::new("depot_search")
        .description("Search for files and folders matching a query.")
        .handler(|ctx: RequestContext, input: SearchInput| async move {
            let client = ctx.client()?;
            let results = client.search(&input.query, input.limit).await?;
            Ok(CallToolResult::json(&results))
        })
}
