//! Tool execution handlers.
//!
//! Cleanup and forecast handlers live in [`cleanup`]; label and health
//! handlers in [`labels`].

mod cleanup;
mod labels;

pub use cleanup::{
    execute_cleanup_all, execute_cleanup_instances, execute_cleanup_services,
    execute_list_expiring,
};
pub use labels::{HEALTHY_MESSAGE, execute_generate_labels, execute_health_check};

use super::{ToolContent, ToolResult};
use crate::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parses tool arguments, treating `null` as an empty object.
fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = if arguments.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| Error::InvalidInput(e.to_string()))
}

/// Wraps a serializable value as pretty JSON text content.
fn json_result<T: Serialize>(value: &T, is_error: bool) -> Result<ToolResult> {
    let text = serde_json::to_string_pretty(value).map_err(|e| Error::OperationFailed {
        operation: "serialize_tool_result".to_string(),
        cause: e.to_string(),
    })?;
    Ok(ToolResult {
        content: vec![ToolContent::Text { text }],
        is_error,
    })
}
