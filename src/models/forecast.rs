//! Expiration forecast results.

use super::{CleanupStatus, ResourceKind, Scope};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Owner reported when a resource has no `owner` label.
pub const UNKNOWN_OWNER: &str = "unknown";

/// A managed resource that will expire within the forecast horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpirationForecastEntry {
    /// Resource name.
    pub name: String,
    /// Zone or region.
    #[serde(flatten)]
    pub scope: Scope,
    /// Creation instant parsed from `created-at`.
    pub created_at: DateTime<Utc>,
    /// Raw TTL label.
    pub ttl: String,
    /// `created_at + ttl`.
    pub expires_at: DateTime<Utc>,
    /// Whole days until expiration.
    pub days_until_expiration: i64,
    /// Total hours until expiration (`days * 24 + remainder hours`).
    pub hours_until_expiration: i64,
    /// Backend status string.
    pub status: String,
    /// Owner label, `"unknown"` when absent.
    pub owner: String,
}

/// A managed resource labelled `ttl=never`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermanentResourceEntry {
    /// Resource name.
    pub name: String,
    /// Zone or region.
    #[serde(flatten)]
    pub scope: Scope,
    /// Raw TTL label (`never` in any casing).
    pub ttl: String,
    /// Raw `created-at` label.
    pub created_at: String,
    /// Backend status string.
    pub status: String,
}

/// Forecast of upcoming expirations for one resource kind and scope.
#[derive(Debug, Clone, Serialize)]
pub struct ExpirationForecast {
    /// Outcome status (`success` or `error`).
    pub status: CleanupStatus,
    /// Resource kind forecast.
    pub resource_type: ResourceKind,
    /// Zone or region scanned.
    #[serde(flatten)]
    pub scope: Scope,
    /// Horizon in days.
    pub days_threshold: u32,
    /// Resources expiring within the horizon, soonest first.
    pub expiring_soon: Vec<ExpirationForecastEntry>,
    /// Resources that never expire.
    pub permanent_resources: Vec<PermanentResourceEntry>,
    /// Number of entries in `expiring_soon`.
    pub expiring_soon_count: usize,
    /// Number of entries in `permanent_resources`.
    pub permanent_count: usize,
    /// Human-readable outcome.
    pub message: String,
    /// Whole-operation error text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExpirationForecast {
    /// Builds a successful forecast.
    #[must_use]
    pub fn new(
        kind: ResourceKind,
        scope: Scope,
        days_threshold: u32,
        expiring_soon: Vec<ExpirationForecastEntry>,
        permanent_resources: Vec<PermanentResourceEntry>,
    ) -> Self {
        let message = format!(
            "Found {} resources expiring within {days_threshold} days",
            expiring_soon.len()
        );
        Self {
            status: CleanupStatus::Success,
            resource_type: kind,
            scope,
            days_threshold,
            expiring_soon_count: expiring_soon.len(),
            permanent_count: permanent_resources.len(),
            expiring_soon,
            permanent_resources,
            message,
            error: None,
        }
    }

    /// Builds a forecast for a listing that failed.
    #[must_use]
    pub fn failed(
        kind: ResourceKind,
        scope: Scope,
        days_threshold: u32,
        error: &crate::Error,
    ) -> Self {
        let status = if matches!(error, crate::Error::NotImplemented(_)) {
            CleanupStatus::NotImplemented
        } else {
            CleanupStatus::Error
        };
        Self {
            status,
            resource_type: kind,
            scope,
            days_threshold,
            expiring_soon: Vec::new(),
            permanent_resources: Vec::new(),
            expiring_soon_count: 0,
            permanent_count: 0,
            message: format!("Failed to list expiring resources: {error}"),
            error: Some(error.to_string()),
        }
    }
}
