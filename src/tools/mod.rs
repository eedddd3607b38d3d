//! Business tools.
//!
//! Mechanical collaborators: each tool resolves its authenticated client
//! through the request context, forwards one Depot API call, and renders the
//! response as text content. Tools never authenticate on their own.

pub mod files;
pub mod folders;
pub mod generic;
pub mod search;
pub mod users;

use crate::tool::Tool;

pub use generic::ServerInfo;

/// All tools this server registers, in listing order.
pub fn all(info: ServerInfo) -> Vec<Tool> {
    let mut tools = vec![generic::who_am_i(), generic::server_info(info)];
    tools.extend(files::tools());
    tools.extend(folders::tools());
    tools.push(search::search());
    tools.extend(users::tools());
    tools
}
