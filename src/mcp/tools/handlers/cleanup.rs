//! Cleanup and forecast tool handlers.

use super::{json_result, parse_args};
use crate::Result;
use crate::mcp::tool_types::{
    CleanupAllArgs, CleanupInstancesArgs, CleanupServicesArgs, ListExpiringArgs,
};
use crate::mcp::tools::ToolResult;
use crate::models::CleanupStatus;
use crate::services::CleanupService;
use serde_json::Value;

/// Executes `cleanup_expired_instances`.
pub async fn execute_cleanup_instances(
    service: &CleanupService,
    arguments: Value,
) -> Result<ToolResult> {
    let args: CleanupInstancesArgs = parse_args(arguments)?;
    let report = service
        .cleanup_expired_instances(args.zone.as_deref(), args.dry_run)
        .await;
    json_result(&report, report.status == CleanupStatus::Error)
}

/// Executes `cleanup_expired_services`.
pub async fn execute_cleanup_services(
    service: &CleanupService,
    arguments: Value,
) -> Result<ToolResult> {
    let args: CleanupServicesArgs = parse_args(arguments)?;
    let report = service
        .cleanup_expired_services(args.region.as_deref(), args.dry_run)
        .await;
    json_result(&report, report.status == CleanupStatus::Error)
}

/// Executes `cleanup_all_expired_resources`.
pub async fn execute_cleanup_all(service: &CleanupService, arguments: Value) -> Result<ToolResult> {
    let args: CleanupAllArgs = parse_args(arguments)?;
    let report = service
        .cleanup_all_expired_resources(args.zone.as_deref(), args.region.as_deref(), args.dry_run)
        .await;
    json_result(&report, report.status == CleanupStatus::Error)
}

/// Executes `list_expiring_resources`.
pub async fn execute_list_expiring(
    service: &CleanupService,
    arguments: Value,
) -> Result<ToolResult> {
    let args: ListExpiringArgs = parse_args(arguments)?;
    let forecast = service
        .list_expiring_resources(args.zone.as_deref(), args.days_until_expiration)
        .await;
    json_result(&forecast, forecast.status == CleanupStatus::Error)
}
