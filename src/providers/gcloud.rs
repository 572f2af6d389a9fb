//! `gcloud` CLI provider.
//!
//! Shells out to the Google Cloud SDK with `--format=json` and parses the
//! output. Credentials and project selection follow whatever the SDK is
//! configured with, optionally pinned by `--project`.

use super::{ResourcePage, ResourceProvider};
use crate::models::{LabelMap, ResourceDescriptor, ResourceKind, Scope};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Default per-command timeout.
pub const DEFAULT_GCLOUD_TIMEOUT_SECS: u64 = 120;

/// How to invoke `gcloud`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcloudSettings {
    /// Path or name of the `gcloud` binary.
    pub binary: PathBuf,
    /// Project passed as `--project`, if any.
    pub project_id: Option<String>,
    /// Per-command timeout.
    pub timeout: Duration,
}

impl Default for GcloudSettings {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("gcloud"),
            project_id: None,
            timeout: Duration::from_secs(DEFAULT_GCLOUD_TIMEOUT_SECS),
        }
    }
}

/// Provider backed by the `gcloud` CLI.
#[derive(Debug, Clone)]
pub struct GcloudCliProvider {
    kind: ResourceKind,
    settings: GcloudSettings,
}

impl GcloudCliProvider {
    /// Creates a provider for `kind`.
    #[must_use]
    pub const fn new(kind: ResourceKind, settings: GcloudSettings) -> Self {
        Self { kind, settings }
    }

    /// Builds the argument list for a listing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the scope level does not match the
    /// kind (instances are zonal, services regional).
    pub fn list_args(&self, scope: &Scope) -> Result<Vec<String>> {
        let mut args: Vec<String> = match (self.kind, scope) {
            (ResourceKind::ComputeInstance, Scope::Zone(zone)) => {
                vec!["compute", "instances", "list", "--zones", zone.as_str()]
                    .into_iter()
                    .map(String::from)
                    .collect()
            },
            (ResourceKind::CloudRunService, Scope::Region(region)) => {
                vec![
                    "run",
                    "services",
                    "list",
                    "--platform",
                    "managed",
                    "--region",
                    region.as_str(),
                ]
                .into_iter()
                .map(String::from)
                .collect()
            },
            _ => return Err(self.scope_mismatch(scope)),
        };
        args.push("--format=json".to_string());
        self.push_project(&mut args);
        Ok(args)
    }

    /// Builds the argument list for a deletion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] on a scope level mismatch.
    pub fn delete_args(&self, name: &str, scope: &Scope) -> Result<Vec<String>> {
        let mut args: Vec<String> = match (self.kind, scope) {
            (ResourceKind::ComputeInstance, Scope::Zone(zone)) => {
                vec!["compute", "instances", "delete", name, "--zone", zone.as_str()]
                    .into_iter()
                    .map(String::from)
                    .collect()
            },
            (ResourceKind::CloudRunService, Scope::Region(region)) => {
                vec![
                    "run",
                    "services",
                    "delete",
                    name,
                    "--platform",
                    "managed",
                    "--region",
                    region.as_str(),
                ]
                .into_iter()
                .map(String::from)
                .collect()
            },
            _ => return Err(self.scope_mismatch(scope)),
        };
        args.push("--quiet".to_string());
        self.push_project(&mut args);
        Ok(args)
    }

    fn push_project(&self, args: &mut Vec<String>) {
        if let Some(project) = &self.settings.project_id {
            args.push("--project".to_string());
            args.push(project.clone());
        }
    }

    fn scope_mismatch(&self, scope: &Scope) -> Error {
        Error::InvalidInput(format!("{} cannot be scoped by {}", self.kind, scope.level()))
    }

    /// Runs `gcloud` and returns stdout.
    async fn run(&self, operation: &str, args: &[String]) -> Result<String> {
        debug!(binary = %self.settings.binary.display(), args = ?args, "Running gcloud command");

        let future = Command::new(&self.settings.binary)
            .args(args)
            .kill_on_drop(true)
            .output();

        let output = timeout(self.settings.timeout, future)
            .await
            .map_err(|_| Error::ProviderFailure {
                operation: operation.to_string(),
                cause: format!("gcloud timed out after {:?}", self.settings.timeout),
            })?
            .map_err(|e| Error::ProviderFailure {
                operation: operation.to_string(),
                cause: format!("failed to run gcloud: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(args = ?args, stderr = %stderr, "gcloud command failed");
            return Err(Error::ProviderFailure {
                operation: operation.to_string(),
                cause: if stderr.is_empty() {
                    format!("gcloud exited with {}", output.status)
                } else {
                    stderr
                },
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl ResourceProvider for GcloudCliProvider {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    async fn list_page(&self, scope: &Scope, _page_token: Option<&str>) -> Result<ResourcePage> {
        let args = self.list_args(scope)?;
        let stdout = self.run("list", &args).await?;
        let resources = match self.kind {
            ResourceKind::ComputeInstance => parse_instances_json(&stdout)?,
            ResourceKind::CloudRunService => parse_services_json(&stdout)?,
        };
        // gcloud pages internally and returns the full listing.
        Ok(ResourcePage::last(resources))
    }

    async fn delete(&self, name: &str, scope: &Scope) -> Result<()> {
        let args = self.delete_args(name, scope)?;
        self.run("delete", &args).await.map(|_| ())
    }
}

#[derive(Debug, Deserialize)]
struct InstanceRecord {
    name: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    labels: Option<LabelMap>,
}

#[derive(Debug, Deserialize)]
struct ServiceRecord {
    metadata: ServiceMetadata,
    #[serde(default)]
    status: Option<ServiceStatus>,
}

#[derive(Debug, Deserialize)]
struct ServiceMetadata {
    name: String,
    #[serde(default)]
    labels: Option<LabelMap>,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceStatus {
    #[serde(default)]
    conditions: Vec<ServiceCondition>,
}

#[derive(Debug, Deserialize)]
struct ServiceCondition {
    #[serde(rename = "type")]
    kind: String,
    status: String,
}

fn parse_error(e: &serde_json::Error) -> Error {
    Error::ProviderFailure {
        operation: "list".to_string(),
        cause: format!("unexpected gcloud output: {e}"),
    }
}

/// Parses `gcloud compute instances list --format=json` output.
///
/// # Errors
///
/// Returns [`Error::ProviderFailure`] if the output is not the expected JSON.
pub fn parse_instances_json(json: &str) -> Result<Vec<ResourceDescriptor>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    let records: Vec<InstanceRecord> = serde_json::from_str(json).map_err(|e| parse_error(&e))?;

    Ok(records
        .into_iter()
        .map(|record| ResourceDescriptor {
            name: record.name,
            labels: record.labels,
            status: record.status,
            kind: ResourceKind::ComputeInstance,
        })
        .collect())
}

/// Parses `gcloud run services list --format=json` output.
///
/// The status is derived from the `Ready` condition: `Ready`, `NotReady`, or
/// `Unknown`.
///
/// # Errors
///
/// Returns [`Error::ProviderFailure`] if the output is not the expected JSON.
pub fn parse_services_json(json: &str) -> Result<Vec<ResourceDescriptor>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    let records: Vec<ServiceRecord> = serde_json::from_str(json).map_err(|e| parse_error(&e))?;

    Ok(records
        .into_iter()
        .map(|record| {
            let ready = record
                .status
                .unwrap_or_default()
                .conditions
                .into_iter()
                .find(|condition| condition.kind == "Ready")
                .map(|condition| condition.status);
            let status = match ready.as_deref() {
                Some("True") => "Ready",
                Some(_) => "NotReady",
                None => "Unknown",
            };
            ResourceDescriptor {
                name: record.metadata.name,
                labels: record.metadata.labels,
                status: status.to_string(),
                kind: ResourceKind::CloudRunService,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> GcloudSettings {
        GcloudSettings {
            project_id: Some("demo-project".to_string()),
            ..GcloudSettings::default()
        }
    }

    #[test]
    fn test_instance_args() {
        let provider = GcloudCliProvider::new(ResourceKind::ComputeInstance, settings());
        let zone = Scope::zone("us-central1-a");

        assert_eq!(
            provider.list_args(&zone).expect("args"),
            vec![
                "compute",
                "instances",
                "list",
                "--zones",
                "us-central1-a",
                "--format=json",
                "--project",
                "demo-project"
            ]
        );
        assert_eq!(
            provider.delete_args("vm-1", &zone).expect("args"),
            vec![
                "compute",
                "instances",
                "delete",
                "vm-1",
                "--zone",
                "us-central1-a",
                "--quiet",
                "--project",
                "demo-project"
            ]
        );
    }

    #[test]
    fn test_service_args() {
        let provider = GcloudCliProvider::new(ResourceKind::CloudRunService, GcloudSettings::default());
        let args = provider
            .delete_args("api", &Scope::region("us-central1"))
            .expect("args");
        assert_eq!(args[..3], ["run", "services", "delete"]);
        assert!(args.contains(&"--quiet".to_string()));
        assert!(!args.contains(&"--project".to_string()));
    }

    #[test]
    fn test_scope_mismatch() {
        let provider = GcloudCliProvider::new(ResourceKind::ComputeInstance, settings());
        assert!(matches!(
            provider.list_args(&Scope::region("us-central1")),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_parse_instances_json() {
        let json = r#"[
            {"name": "vm-1", "status": "RUNNING", "labels": {"managed-by": "mcp", "ttl": "7d"}},
            {"name": "vm-2", "status": "TERMINATED"}
        ]"#;
        let resources = parse_instances_json(json).expect("parse");

        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].label("managed-by"), Some("mcp"));
        assert_eq!(resources[1].labels, None);
        assert_eq!(resources[1].status, "TERMINATED");
    }

    #[test]
    fn test_parse_services_json() {
        let json = r#"[
            {"metadata": {"name": "api", "labels": {"managed-by": "mcp"}},
             "status": {"conditions": [{"type": "Ready", "status": "True"}]}},
            {"metadata": {"name": "worker"},
             "status": {"conditions": [{"type": "Ready", "status": "False"}]}},
            {"metadata": {"name": "new"}}
        ]"#;
        let resources = parse_services_json(json).expect("parse");

        assert_eq!(resources[0].status, "Ready");
        assert_eq!(resources[1].status, "NotReady");
        assert_eq!(resources[2].status, "Unknown");
        assert_eq!(resources[0].kind, ResourceKind::CloudRunService);
    }

    #[test]
    fn test_parse_empty_and_invalid() {
        assert!(parse_instances_json("").expect("empty").is_empty());
        assert!(parse_services_json("[]").expect("empty array").is_empty());
        assert!(matches!(
            parse_instances_json("not json"),
            Err(Error::ProviderFailure { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_provider_failure() {
        let provider = GcloudCliProvider::new(
            ResourceKind::ComputeInstance,
            GcloudSettings {
                binary: PathBuf::from("/nonexistent/gcloud-binary"),
                ..GcloudSettings::default()
            },
        );
        let err = provider
            .list_page(&Scope::zone("us-central1-a"), None)
            .await
            .expect_err("spawn should fail");
        assert!(matches!(err, Error::ProviderFailure { .. }));
    }
}
