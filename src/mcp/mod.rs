//! MCP server implementation.
//!
//! Exposes the lifecycle operations as Model Context Protocol tools so an
//! agent can clean up and inspect the resources it provisioned.
//!
//! ## Tools
//!
//! `health_check`, `cleanup_expired_instances`, `cleanup_expired_services`,
//! `cleanup_all_expired_resources`, `list_expiring_resources`,
//! `generate_resource_labels`
//!
//! ## Usage
//!
//! ```bash
//! cloudreap serve
//! ```
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "cloudreap": {
//!       "command": "cloudreap",
//!       "args": ["serve"]
//!     }
//!   }
//! }
//! ```

mod dispatch;
mod server;
mod tool_types;
mod tools;

pub use dispatch::McpMethod;
pub use server::{MAX_REQUEST_BODY_SIZE, McpServer, PROTOCOL_VERSION, RateLimitConfig};
pub use tools::{HEALTHY_MESSAGE, ToolContent, ToolDefinition, ToolRegistry, ToolResult};
