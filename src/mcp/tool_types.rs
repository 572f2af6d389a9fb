//! Argument types for MCP tools.
//!
//! All argument types use `#[serde(deny_unknown_fields)]` so a misspelled
//! argument (for example `dryrun`) is rejected instead of silently ignored.

use crate::models::LabelMap;
use serde::Deserialize;

/// Arguments for `cleanup_expired_instances`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanupInstancesArgs {
    /// Zone to scan; the configured default zone if omitted.
    pub zone: Option<String>,
    /// Report without deleting.
    #[serde(default)]
    pub dry_run: bool,
}

/// Arguments for `cleanup_expired_services`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanupServicesArgs {
    /// Region to scan; the configured region if omitted.
    pub region: Option<String>,
    /// Report without deleting.
    #[serde(default)]
    pub dry_run: bool,
}

/// Arguments for `cleanup_all_expired_resources`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanupAllArgs {
    /// Zone for compute instances.
    pub zone: Option<String>,
    /// Region for Cloud Run services.
    pub region: Option<String>,
    /// Report without deleting.
    #[serde(default)]
    pub dry_run: bool,
}

/// Arguments for `list_expiring_resources`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListExpiringArgs {
    /// Zone to scan.
    pub zone: Option<String>,
    /// Forecast horizon in days (default 7).
    pub days_until_expiration: Option<u32>,
}

/// Arguments for `generate_resource_labels`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateLabelsArgs {
    /// User labels merged over the defaults.
    pub labels: Option<LabelMap>,
    /// TTL override such as `24h`, `7d` or `never`.
    pub ttl: Option<String>,
}

/// Arguments for `health_check`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthCheckArgs {}
