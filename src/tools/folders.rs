//! Folder tools.

use schemars::JsonSchema;
use serde::Deserialize;

use crate::context::RequestContext;
use crate::protocol::CallToolResult;
use crate::tool::{Tool, ToolBuilder};

fn root_folder() -> String {
    // "0" is the Depot root folder.
    "0".to_string()
}

#[derive(Debug, Deserialize, JsonSchema)]
struct FolderListInput {
    /// Folder ID to list. Defaults to the root folder.
    #[serde(default = "root_folder")]
    folder_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct FolderCreateInput {
    /// Name of the new folder.
    name: String,
    /// Parent folder ID. Defaults to the root folder.
    #[serde(default = "root_folder")]
    parent_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct FolderDeleteInput {
    /// Folder ID to delete.
    folder_id: String,
    /// Also delete contained items.
    #[serde(default)]
    recursive: bool,
}

pub fn tools() -> Vec<Tool> {
    vec![folder_list(), folder_create(), folder_delete()]
}

/// `depot_folder_list`: items in a folder.
pub fn folder_list() -> Tool {
    ToolBuilder::new("depot_folder_list")
        .description("List the items in a folder. Lists the root folder when no ID is given.")
        .handler(|ctx: RequestContext, input: FolderListInput| async move {
            let client = ctx.client()?;
            let items = client.folder_items(&input.folder_id).await?;
            Ok(CallToolResult::json(&items))
        })
}

/// `depot_folder_create`: create a folder under a parent.
pub fn folder_create() -> Tool {
    ToolBuilder::new("depot_folder_create")
        .description("Create a new folder under the given parent folder.")
        .handler(|ctx: RequestContext, input: FolderCreateInput| async move {
            let client = ctx.client()?;
            let folder = client.create_folder(&input.name, &input.parent_id).await?;
            Ok(CallToolResult::json(&folder))
        })
}

/// `depot_folder_delete`: delete a folder.
pub fn folder_delete() -> Tool {
    ToolBuilder::new("depot_folder_delete")
        .description("Delete a folder, optionally including its contents.")
        .handler(|ctx: RequestContext, input: FolderDeleteInput| async move {
            let client = ctx.client()?;
            client
                .delete_folder(&input.folder_id, input.recursive)
                .await?;
            Ok(CallToolResult::text(format!(
                "Folder {} deleted",
                input.folder_id
            )))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_list_defaults_to_root() {
        let input: FolderListInput = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(input.folder_id, "0");
    }

    #[test]
    fn test_folder_delete_defaults_non_recursive() {
        let input: FolderDeleteInput =
            serde_json::from_value(serde_json::json!({"folder_id": "7"})).unwrap();
        assert!(!input.recursive);
    }

    #[test]
    fn test_create_schema_requires_name_only() {
        let schema = folder_create().descriptor().input_schema;
        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&serde_json::json!("name")));
        assert!(!required.contains(&serde_json::json!("parent_id")));
    }
}
