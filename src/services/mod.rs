//! Business logic services.
//!
//! Services wire configuration, providers, and the lifecycle engine into the
//! operations exposed by the CLI and the MCP server.

mod cleanup;

pub use cleanup::CleanupService;
