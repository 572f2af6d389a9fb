//! Label generation and health handlers.

use super::{json_result, parse_args};
use crate::Result;
use crate::lifecycle::LabelPolicy;
use crate::mcp::tool_types::{GenerateLabelsArgs, HealthCheckArgs};
use crate::mcp::tools::{ToolContent, ToolResult};
use crate::models::LabelMap;
use crate::services::CleanupService;
use serde::Serialize;
use serde_json::Value;

/// Text returned by `health_check`.
pub const HEALTHY_MESSAGE: &str = "MCP Server is healthy";

#[derive(Debug, Serialize)]
struct GeneratedLabels {
    labels: LabelMap,
    label_count: usize,
    ttl: String,
    ttl_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

/// Executes `health_check`.
pub fn execute_health_check(arguments: Value) -> Result<ToolResult> {
    let _: HealthCheckArgs = parse_args(arguments)?;
    Ok(ToolResult {
        content: vec![ToolContent::Text {
            text: HEALTHY_MESSAGE.to_string(),
        }],
        is_error: false,
    })
}

/// Executes `generate_resource_labels`.
///
/// An unparsable TTL is still returned; the resource would then never be
/// cleaned up, so the result carries a warning.
pub fn execute_generate_labels(service: &CleanupService, arguments: Value) -> Result<ToolResult> {
    let args: GenerateLabelsArgs = parse_args(arguments)?;
    let labels = service.generate_labels(args.labels.as_ref(), args.ttl.as_deref());

    let ttl = labels.ttl().to_string();
    let ttl_valid = LabelPolicy::validate_ttl(&ttl);
    let warning = (!ttl_valid).then(|| {
        format!("ttl '{ttl}' is not a valid TTL; resources carrying it are never cleaned up")
    });
    let labels = labels.to_map();

    json_result(
        &GeneratedLabels {
            label_count: labels.len(),
            labels,
            ttl,
            ttl_valid,
            warning,
        },
        false,
    )
}
