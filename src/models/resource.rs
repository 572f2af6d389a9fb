//! Resource kinds, scopes, and descriptors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Raw label mapping as read from a cloud resource.
///
/// Resources in the wild may carry anything, so scans read this untyped form.
pub type LabelMap = BTreeMap<String, String>;

/// Kinds of resources under lifecycle management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Compute Engine virtual machine instances (zonal).
    #[serde(rename = "compute_instances")]
    ComputeInstance,
    /// Cloud Run services (regional).
    #[serde(rename = "cloud_run_services")]
    CloudRunService,
}

impl ResourceKind {
    /// Returns all resource kinds.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::ComputeInstance, Self::CloudRunService]
    }

    /// Returns the kind as the key used in reports.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ComputeInstance => "compute_instances",
            Self::CloudRunService => "cloud_run_services",
        }
    }

    /// Parses a kind from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "compute_instances" | "instances" | "instance" | "compute" => {
                Some(Self::ComputeInstance)
            },
            "cloud_run_services" | "services" | "service" | "cloud-run" | "run" => {
                Some(Self::CloudRunService)
            },
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Location a resource listing or deletion is confined to.
///
/// Serialized as a single `"zone"` or `"region"` entry so reports can
/// flatten it next to their own fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// A compute zone such as `us-central1-a`.
    Zone(String),
    /// A region such as `us-central1`.
    Region(String),
}

impl Scope {
    /// Creates a zone scope.
    #[must_use]
    pub fn zone(name: impl Into<String>) -> Self {
        Self::Zone(name.into())
    }

    /// Creates a region scope.
    #[must_use]
    pub fn region(name: impl Into<String>) -> Self {
        Self::Region(name.into())
    }

    /// Returns the zone or region name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Zone(name) | Self::Region(name) => name,
        }
    }

    /// Returns `"zone"` or `"region"`.
    #[must_use]
    pub const fn level(&self) -> &'static str {
        match self {
            Self::Zone(_) => "zone",
            Self::Region(_) => "region",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.level(), self.name())
    }
}

/// Read-only view of a cloud resource as returned by a provider listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Resource name, unique within its scope.
    pub name: String,
    /// Labels currently attached, `None` when the resource has no label set.
    pub labels: Option<LabelMap>,
    /// Coarse status string reported by the backend (`RUNNING`, `Ready`, ...).
    pub status: String,
    /// Resource kind.
    pub kind: ResourceKind,
}

impl ResourceDescriptor {
    /// Creates a descriptor without labels.
    #[must_use]
    pub fn new(kind: ResourceKind, name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: None,
            status: status.into(),
            kind,
        }
    }

    /// Attaches a label set.
    #[must_use]
    pub fn with_labels(mut self, labels: LabelMap) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Returns a label value, if present.
    #[must_use]
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .as_ref()
            .and_then(|labels| labels.get(key))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!(
            ResourceKind::parse("instances"),
            Some(ResourceKind::ComputeInstance)
        );
        assert_eq!(
            ResourceKind::parse("Cloud_Run_Services"),
            Some(ResourceKind::CloudRunService)
        );
        assert_eq!(ResourceKind::parse("buckets"), None);
    }

    #[test]
    fn test_kind_as_str_roundtrip() {
        for kind in ResourceKind::all() {
            assert_eq!(ResourceKind::parse(kind.as_str()), Some(*kind));
        }
    }

    #[test]
    fn test_scope_serializes_as_single_entry() {
        let json = serde_json::to_value(Scope::zone("us-central1-a")).expect("serialize");
        assert_eq!(json, serde_json::json!({ "zone": "us-central1-a" }));

        let json = serde_json::to_value(Scope::region("europe-west1")).expect("serialize");
        assert_eq!(json, serde_json::json!({ "region": "europe-west1" }));
    }

    #[test]
    fn test_descriptor_label_lookup() {
        let mut labels = LabelMap::new();
        labels.insert("owner".to_string(), "ops".to_string());
        let resource = ResourceDescriptor::new(ResourceKind::ComputeInstance, "vm-1", "RUNNING")
            .with_labels(labels);

        assert_eq!(resource.label("owner"), Some("ops"));
        assert_eq!(resource.label("ttl"), None);
        assert_eq!(
            ResourceDescriptor::new(ResourceKind::ComputeInstance, "vm-2", "RUNNING").label("owner"),
            None
        );
    }
}
