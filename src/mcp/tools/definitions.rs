//! Tool definitions for MCP tools.
//!
//! Contains the JSON Schema definitions for all cloudreap tools.

use super::ToolDefinition;

/// Defines the health check tool.
pub fn health_check_tool() -> ToolDefinition {
    ToolDefinition {
        name: "health_check".to_string(),
        description: "Verify the MCP server is running".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        }),
    }
}

/// Defines the instance cleanup tool.
pub fn cleanup_instances_tool() -> ToolDefinition {
    ToolDefinition {
        name: "cleanup_expired_instances".to_string(),
        description: "Delete Compute Engine instances labeled managed-by=mcp whose created-at + ttl has passed"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "zone": {
                    "type": "string",
                    "description": "Zone to scan (default: configured zone)"
                },
                "dry_run": {
                    "type": "boolean",
                    "description": "Report what would be deleted without deleting (default: false)"
                }
            },
            "required": [],
            "additionalProperties": false
        }),
    }
}

/// Defines the service cleanup tool.
pub fn cleanup_services_tool() -> ToolDefinition {
    ToolDefinition {
        name: "cleanup_expired_services".to_string(),
        description: "Delete Cloud Run services labeled managed-by=mcp whose created-at + ttl has passed"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "region": {
                    "type": "string",
                    "description": "Region to scan (default: configured region)"
                },
                "dry_run": {
                    "type": "boolean",
                    "description": "Report what would be deleted without deleting (default: false)"
                }
            },
            "required": [],
            "additionalProperties": false
        }),
    }
}

/// Defines the combined cleanup tool.
pub fn cleanup_all_tool() -> ToolDefinition {
    ToolDefinition {
        name: "cleanup_all_expired_resources".to_string(),
        description: "Clean up expired instances and services and report a per-type breakdown"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "zone": {
                    "type": "string",
                    "description": "Zone for compute instances"
                },
                "region": {
                    "type": "string",
                    "description": "Region for Cloud Run services"
                },
                "dry_run": {
                    "type": "boolean",
                    "description": "Report what would be deleted without deleting (default: false)"
                }
            },
            "required": [],
            "additionalProperties": false
        }),
    }
}

/// Defines the expiration forecast tool.
pub fn list_expiring_tool() -> ToolDefinition {
    ToolDefinition {
        name: "list_expiring_resources".to_string(),
        description: "List managed instances that expire within the given number of days, plus permanent (ttl=never) ones"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "zone": {
                    "type": "string",
                    "description": "Zone to scan (default: configured zone)"
                },
                "days_until_expiration": {
                    "type": "integer",
                    "description": "Forecast horizon in days (default: 7)",
                    "minimum": 0
                }
            },
            "required": [],
            "additionalProperties": false
        }),
    }
}

/// Defines the label generation tool.
pub fn generate_labels_tool() -> ToolDefinition {
    ToolDefinition {
        name: "generate_resource_labels".to_string(),
        description: "Build the lifecycle labels a new resource should carry: managed-by, owner, created-at, ttl, plus sanitized custom labels"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "labels": {
                    "type": "object",
                    "additionalProperties": { "type": "string" },
                    "description": "Custom labels; keys and values are sanitized"
                },
                "ttl": {
                    "type": "string",
                    "description": "Time to live such as 24h, 7d or never (default: configured TTL)"
                }
            },
            "required": [],
            "additionalProperties": false
        }),
    }
}
