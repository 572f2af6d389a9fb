//! MCP tool implementations.
//!
//! # Module Structure
//!
//! - [`definitions`]: Tool schema definitions (JSON Schema for input validation)
//! - [`handlers`]: Tool execution logic

mod definitions;
mod handlers;

pub use handlers::HEALTHY_MESSAGE;

use crate::services::CleanupService;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of MCP tools.
pub struct ToolRegistry {
    /// Available tools.
    tools: HashMap<String, ToolDefinition>,
    /// Service the lifecycle tools delegate to.
    service: Arc<CleanupService>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.len())
            .finish_non_exhaustive()
    }
}

impl ToolRegistry {
    /// Creates a new tool registry with all cloudreap tools.
    #[must_use]
    pub fn new(service: Arc<CleanupService>) -> Self {
        let tools = [
            definitions::health_check_tool(),
            definitions::cleanup_instances_tool(),
            definitions::cleanup_services_tool(),
            definitions::cleanup_all_tool(),
            definitions::list_expiring_tool(),
            definitions::generate_labels_tool(),
        ]
        .into_iter()
        .map(|tool| (tool.name.clone(), tool))
        .collect();

        Self { tools, service }
    }

    /// Returns all tool definitions, sorted by name.
    #[must_use]
    pub fn list_tools(&self) -> Vec<&ToolDefinition> {
        let mut tools: Vec<&ToolDefinition> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Gets a tool definition by name.
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// Executes a tool with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an unknown tool or malformed
    /// arguments.
    pub async fn execute(&self, name: &str, arguments: Value) -> Result<ToolResult> {
        let service = self.service.as_ref();
        match name {
            "health_check" => handlers::execute_health_check(arguments),
            "cleanup_expired_instances" => {
                handlers::execute_cleanup_instances(service, arguments).await
            },
            "cleanup_expired_services" => {
                handlers::execute_cleanup_services(service, arguments).await
            },
            "cleanup_all_expired_resources" => {
                handlers::execute_cleanup_all(service, arguments).await
            },
            "list_expiring_resources" => handlers::execute_list_expiring(service, arguments).await,
            "generate_resource_labels" => handlers::execute_generate_labels(service, arguments),
            _ => Err(Error::InvalidInput(format!("Unknown tool: {name}"))),
        }
    }
}

/// Definition of an MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON Schema for input validation.
    pub input_schema: Value,
}

/// Result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the result represents an error.
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    /// Returns the concatenated text content.
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|content| match content {
                ToolContent::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Content types that can be returned by tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CloudreapConfig;
    use crate::lifecycle::FixedClock;
    use crate::models::{LabelMap, ResourceDescriptor, ResourceKind, Scope};
    use crate::providers::{InMemoryProvider, ResourceProvider};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn registry() -> (ToolRegistry, Arc<InMemoryProvider>) {
        let now = Utc
            .with_ymd_and_hms(2025, 5, 20, 9, 0, 0)
            .single()
            .expect("valid date");
        let instances = Arc::new(InMemoryProvider::new(ResourceKind::ComputeInstance));
        let service = CleanupService::new(
            CloudreapConfig::default().with_owner("agent"),
            vec![Arc::clone(&instances) as Arc<dyn ResourceProvider>],
            Arc::new(FixedClock::new(now)),
        );
        (ToolRegistry::new(Arc::new(service)), instances)
    }

    fn expired(name: &str) -> ResourceDescriptor {
        let labels: LabelMap = [
            ("managed-by", "mcp"),
            ("created-at", "20250501-000000"),
            ("ttl", "1d"),
        ]
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
        ResourceDescriptor::new(ResourceKind::ComputeInstance, name, "RUNNING").with_labels(labels)
    }

    #[test]
    fn test_tool_registry_creation() {
        let (registry, _) = registry();
        let names: Vec<&str> = registry
            .list_tools()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "cleanup_all_expired_resources",
                "cleanup_expired_instances",
                "cleanup_expired_services",
                "generate_resource_labels",
                "health_check",
                "list_expiring_resources",
            ]
        );
        assert!(registry.get_tool("health_check").is_some());
        assert!(registry.get_tool("delete_everything").is_none());
    }

    #[tokio::test]
    async fn test_execute_health_check() {
        let (registry, _) = registry();
        let result = registry
            .execute("health_check", Value::Null)
            .await
            .expect("health");
        assert_eq!(result.text(), HEALTHY_MESSAGE);
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let (registry, _) = registry();
        let err = registry
            .execute("launch_rocket", json!({}))
            .await
            .expect_err("unknown");
        assert!(matches!(err, Error::InvalidInput(msg) if msg.contains("launch_rocket")));
    }

    #[tokio::test]
    async fn test_execute_rejects_unknown_arguments() {
        let (registry, _) = registry();
        let err = registry
            .execute("cleanup_expired_instances", json!({"dryRun": true}))
            .await
            .expect_err("unknown field");
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_execute_cleanup_dry_run() {
        let (registry, instances) = registry();
        let zone = Scope::zone("us-central1-a");
        instances.insert(&zone, expired("stale")).expect("insert");

        let result = registry
            .execute("cleanup_expired_instances", json!({"dry_run": true}))
            .await
            .expect("cleanup");
        let body: Value = serde_json::from_str(&result.text()).expect("json");

        assert_eq!(body["status"], "success");
        assert_eq!(body["dry_run"], true);
        assert_eq!(body["zone"], "us-central1-a");
        assert_eq!(body["summary"]["deleted_resources"], json!(["stale"]));
        assert!(instances.contains(&zone, "stale").expect("contains"));
    }

    #[tokio::test]
    async fn test_execute_services_not_implemented() {
        let (registry, _) = registry();
        let result = registry
            .execute("cleanup_expired_services", json!({"region": "us-east1"}))
            .await
            .expect("cleanup");
        let body: Value = serde_json::from_str(&result.text()).expect("json");

        assert_eq!(body["status"], "not_implemented");
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn test_execute_generate_labels() {
        let (registry, _) = registry();
        let result = registry
            .execute(
                "generate_resource_labels",
                json!({"labels": {"Team": "ML Ops", "managed-by": "me"}, "ttl": "2w"}),
            )
            .await
            .expect("labels");
        let body: Value = serde_json::from_str(&result.text()).expect("json");

        assert_eq!(body["labels"]["managed-by"], "mcp");
        assert_eq!(body["labels"]["owner"], "agent");
        assert_eq!(body["labels"]["team"], "ml-ops");
        assert_eq!(body["labels"]["created-at"], "20250520-090000");
        assert_eq!(body["ttl_valid"], false);
        assert!(body["warning"].is_string());
    }
}
