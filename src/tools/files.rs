//! File tools.

use schemars::JsonSchema;
use serde::Deserialize;

use crate::context::RequestContext;
use crate::protocol::CallToolResult;
use crate::tool::{Tool, ToolBuilder};

#[derive(Debug, Deserialize, JsonSchema)]
struct FileIdInput {
    /// Depot file ID.
    file_id: String,
}

pub fn tools() -> Vec<Tool> {
    vec![file_info(), file_text()]
}

/// `depot_file_info`: file metadata by ID.
pub fn file_info() -> Tool {
    ToolBuilder::new("depot_file_info")
        .description("Get metadata for a file by its Depot file ID.")
        .handler(|ctx: RequestContext, input: FileIdInput| async move {
            let client = ctx.client()?;
            let info = client.file_info(&input.file_id).await?;
            Ok(CallToolResult::json(&info))
        })
}

/// `depot_file_text`: textual content of a file.
pub fn file_text() -> Tool {
    ToolBuilder::new("depot_file_text")
        .description("Download the textual content of a file by its Depot file ID.")
        .handler(|ctx: RequestContext, input: FileIdInput| async move {
            let client = ctx.client()?;
            let text = client.file_text(&input.file_id).await?;
            Ok(CallToolResult::text(text))
        })
}
