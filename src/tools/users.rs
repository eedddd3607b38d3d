//! User tools.

use schemars::JsonSchema;
use serde::Deserialize;

use crate::context::RequestContext;
use crate::protocol::CallToolResult;
use crate::tool::{Tool, ToolBuilder};

#[derive(Debug, Deserialize, JsonSchema)]
struct UserListInput {
    /// Maximum number of users to return.
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct UserGetInput {
    /// Depot user ID.
    user_id: String,
}

pub fn tools() -> Vec<Tool> {
    vec![user_list(), user_get()]
}

/// `depot_user_list`: enumerate users visible to this client.
pub fn user_list() -> Tool {
    ToolBuilder::new("depot_user_list")
        .description("List the users visible to the authenticated client.")
        .handler(|ctx: RequestContext, input: UserListInput| async move {
            let client = ctx.client()?;
            let users = client.list_users(input.limit).await?;
            Ok(CallToolResult::json(&users))
        })
}

/// `depot_user_get`: one user by ID.
pub fn user_get() -> Tool {
    ToolBuilder::new("depot_user_get")
        .description("Get a user's information by their Depot user ID.")
        .handler(|ctx: RequestContext, input: UserGetInput| async move {
            let client = ctx.client()?;
            let user = client.get_user(&input.user_id).await?;
            Ok(CallToolResult::json(&user))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_get_schema_requires_user_id() {
        let schema = user_get().descriptor().input_schema;
        assert!(schema["required"]
            .as_array()
            .unwrap()
            .contains(&serde_json::json!("user_id")));
    }
}
