//! Text and JSON rendering of command results.

use super::OutputFormat;
use crate::config::CloudreapConfig;
use crate::models::{
    CleanupReport, CleanupSummary, CombinedCleanupReport, ExpirationForecast, ResourceLabels,
};
use crate::{Error, Result};
use serde::Serialize;

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| Error::OperationFailed {
        operation: "render_json".to_string(),
        cause: e.to_string(),
    })
}

fn push_summary(out: &mut String, summary: &CleanupSummary, indent: &str) {
    out.push_str(&format!(
        "{indent}scanned: {}  expired: {}  deleted: {}  failed: {}  success rate: {}\n",
        summary.total_scanned,
        summary.expired_count,
        summary.deleted_count,
        summary.failed_count,
        summary.success_rate()
    ));
    if !summary.deleted_resources.is_empty() {
        let heading = if summary.dry_run {
            "would delete"
        } else {
            "deleted"
        };
        out.push_str(&format!("{indent}{heading}:\n"));
        for name in &summary.deleted_resources {
            out.push_str(&format!("{indent}  - {name}\n"));
        }
    }
    if !summary.failed_resources.is_empty() {
        out.push_str(&format!("{indent}failed:\n"));
        for failed in &summary.failed_resources {
            out.push_str(&format!("{indent}  - {}: {}\n", failed.name, failed.error));
        }
    }
}

/// Renders a single-kind cleanup report.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_cleanup_report(report: &CleanupReport, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(report);
    }

    let mut out = format!(
        "{} ({}): {}\n{}\n",
        report.resource_type, report.scope, report.status, report.message
    );
    push_summary(&mut out, &report.summary, "  ");
    Ok(out)
}

/// Renders a combined cleanup report.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_combined_report(
    report: &CombinedCleanupReport,
    format: OutputFormat,
) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(report);
    }

    let mut out = format!("all resources: {}\n{}\n", report.status, report.message);
    push_summary(&mut out, &report.summary, "  ");
    for kind_report in report.by_resource_type.values() {
        out.push_str(&format!(
            "\n{} ({}): {}\n  {}\n",
            kind_report.resource_type, kind_report.scope, kind_report.status, kind_report.message
        ));
        push_summary(&mut out, &kind_report.summary, "    ");
    }
    Ok(out)
}

/// Renders an expiration forecast.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_forecast(forecast: &ExpirationForecast, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(forecast);
    }

    let mut out = format!(
        "{} ({}): {}\n{}\n",
        forecast.resource_type, forecast.scope, forecast.status, forecast.message
    );
    for entry in &forecast.expiring_soon {
        out.push_str(&format!(
            "  - {} expires {} (in {}d {}h, ttl {}, owner {})\n",
            entry.name,
            entry.expires_at.format("%Y-%m-%d %H:%M:%S UTC"),
            entry.days_until_expiration,
            entry.hours_until_expiration - entry.days_until_expiration * 24,
            entry.ttl,
            entry.owner
        ));
    }
    if !forecast.permanent_resources.is_empty() {
        out.push_str(&format!(
            "permanent resources ({}):\n",
            forecast.permanent_count
        ));
        for entry in &forecast.permanent_resources {
            out.push_str(&format!("  - {} ({})\n", entry.name, entry.status));
        }
    }
    Ok(out)
}

/// Renders a generated label set as `key=value` lines.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_labels(labels: &ResourceLabels, format: OutputFormat) -> Result<String> {
    let map = labels.to_map();
    if format == OutputFormat::Json {
        return to_json(&map);
    }

    Ok(map
        .iter()
        .map(|(key, value)| format!("{key}={value}\n"))
        .collect())
}

#[derive(Serialize)]
struct ConfigView<'a> {
    project_id: Option<&'a str>,
    region: &'a str,
    default_zone: &'a str,
    owner: &'a str,
    default_ttl: &'a str,
    gcloud_binary: String,
    gcloud_timeout_secs: u64,
    log_format: Option<&'a str>,
    log_level: Option<&'a str>,
    log_file: Option<&'a str>,
    metrics_enabled: bool,
    metrics_port: Option<u16>,
}

impl<'a> ConfigView<'a> {
    fn new(config: &'a CloudreapConfig) -> Self {
        let logging = config.observability.logging.as_ref();
        let metrics = config.observability.metrics.as_ref();
        Self {
            project_id: config.project_id.as_deref(),
            region: &config.region,
            default_zone: &config.default_zone,
            owner: &config.owner,
            default_ttl: &config.default_ttl,
            gcloud_binary: config.gcloud.binary.display().to_string(),
            gcloud_timeout_secs: config.gcloud.timeout.as_secs(),
            log_format: logging.and_then(|l| l.format.as_deref()),
            log_level: logging.and_then(|l| l.level.as_deref()),
            log_file: logging.and_then(|l| l.file.as_deref()),
            metrics_enabled: metrics.and_then(|m| m.enabled).unwrap_or(false),
            metrics_port: metrics.and_then(|m| m.port),
        }
    }
}

/// Renders the effective configuration.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_config(config: &CloudreapConfig, format: OutputFormat) -> Result<String> {
    let view = ConfigView::new(config);
    if format == OutputFormat::Json {
        return to_json(&view);
    }

    let unset = "(unset)";
    Ok(format!(
        "Current Configuration\n\
         =====================\n\
         Project: {}\n\
         Region: {}\n\
         Default Zone: {}\n\
         Owner: {}\n\
         Default TTL: {}\n\
         gcloud: {} (timeout {}s)\n\
         Log Format: {}\n\
         Log Level: {}\n\
         Log File: {}\n\
         Metrics: {}\n",
        view.project_id.unwrap_or(unset),
        view.region,
        view.default_zone,
        view.owner,
        view.default_ttl,
        view.gcloud_binary,
        view.gcloud_timeout_secs,
        view.log_format.unwrap_or("pretty"),
        view.log_level.unwrap_or("info"),
        view.log_file.unwrap_or("stderr"),
        if view.metrics_enabled {
            "enabled"
        } else {
            "disabled"
        },
    ))
}
