//! Cleanup run results.

use super::{ResourceKind, Scope};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;

/// A resource whose deletion was attempted and failed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FailedResource {
    /// Resource name.
    pub name: String,
    /// Error text reported by the provider.
    pub error: String,
}

/// Share of expired resources that were deleted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SuccessRate {
    /// `deleted / expired * 100`.
    Percent(f64),
    /// Nothing expired, so the rate is undefined.
    NotApplicable,
}

impl fmt::Display for SuccessRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent(rate) => write!(f, "{rate:.1}%"),
            Self::NotApplicable => write!(f, "N/A"),
        }
    }
}

impl Serialize for SuccessRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Counts and outcomes of one scan-evaluate-delete pass.
///
/// Invariant: `deleted_count + failed_count <= expired_count <= total_scanned`.
/// In dry-run mode `deleted_count` counts resources that would be deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    /// Resources listed.
    pub total_scanned: usize,
    /// Resources evaluated as expired.
    pub expired_count: usize,
    /// Resources deleted (or that would be, in dry-run mode).
    pub deleted_count: usize,
    /// Resources whose deletion failed.
    pub failed_count: usize,
    /// Names of deleted resources, in scan order; sorted after `combine`.
    pub deleted_resources: Vec<String>,
    /// Failed deletions with error text, in scan order; sorted after `combine`.
    pub failed_resources: Vec<FailedResource>,
    /// Whether no deletions were issued.
    pub dry_run: bool,
}

impl CleanupSummary {
    /// Creates an empty summary.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Records a successful (or simulated) deletion.
    pub fn record_deleted(&mut self, name: impl Into<String>) {
        self.deleted_count += 1;
        self.deleted_resources.push(name.into());
    }

    /// Records a failed deletion.
    pub fn record_failed(&mut self, name: impl Into<String>, error: impl Into<String>) {
        self.failed_count += 1;
        self.failed_resources.push(FailedResource {
            name: name.into(),
            error: error.into(),
        });
    }

    /// Returns the success rate, `N/A` when nothing expired.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // counts are far below 2^52
    pub fn success_rate(&self) -> SuccessRate {
        if self.expired_count == 0 {
            return SuccessRate::NotApplicable;
        }
        SuccessRate::Percent(self.deleted_count as f64 / self.expired_count as f64 * 100.0)
    }

    /// Returns `true` if any deletion failed.
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.failed_count > 0
    }

    /// Returns a human-readable summary line.
    ///
    /// The wording is the same in dry-run mode; the report's `dry_run` flag
    /// tells the two apart.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Cleanup complete: {} deleted, {} failed out of {} expired resources",
            self.deleted_count, self.failed_count, self.expired_count
        )
    }

    /// Sums two summaries field by field.
    ///
    /// Resource lists are merged and sorted so the operation is commutative
    /// and associative, with `CleanupSummary::default()` as identity.
    #[must_use]
    pub fn combine(mut self, other: Self) -> Self {
        self.total_scanned += other.total_scanned;
        self.expired_count += other.expired_count;
        self.deleted_count += other.deleted_count;
        self.failed_count += other.failed_count;
        self.deleted_resources.extend(other.deleted_resources);
        self.deleted_resources.sort();
        self.failed_resources.extend(other.failed_resources);
        self.failed_resources.sort();
        self.dry_run |= other.dry_run;
        self
    }
}

impl Sum for CleanupSummary {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Self::combine)
    }
}

impl Serialize for CleanupSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CleanupSummary", 7)?;
        state.serialize_field("total_scanned", &self.total_scanned)?;
        state.serialize_field("total_expired", &self.expired_count)?;
        state.serialize_field("total_deleted", &self.deleted_count)?;
        state.serialize_field("total_failed", &self.failed_count)?;
        state.serialize_field("success_rate", &self.success_rate())?;
        state.serialize_field("deleted_resources", &self.deleted_resources)?;
        state.serialize_field("failed_resources", &self.failed_resources)?;
        state.end()
    }
}

/// Outcome status of a cleanup or forecast call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupStatus {
    /// Every expired resource was handled.
    Success,
    /// At least one deletion (or one kind) failed.
    PartialFailure,
    /// The resource kind cannot be enumerated.
    NotImplemented,
    /// The whole operation failed.
    Error,
}

impl CleanupStatus {
    /// Returns the status as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::PartialFailure => "partial_failure",
            Self::NotImplemented => "not_implemented",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for CleanupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Report for one resource kind in one scope.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    /// Outcome status.
    pub status: CleanupStatus,
    /// Resource kind scanned.
    pub resource_type: ResourceKind,
    /// Zone or region scanned.
    #[serde(flatten)]
    pub scope: Scope,
    /// Whether deletions were simulated.
    pub dry_run: bool,
    /// Counts and resource lists.
    pub summary: CleanupSummary,
    /// Human-readable outcome.
    pub message: String,
    /// Whole-operation error text, when the scan itself failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CleanupReport {
    /// Builds a report from a completed scan.
    #[must_use]
    pub fn completed(kind: ResourceKind, scope: Scope, summary: CleanupSummary) -> Self {
        let status = if summary.has_failures() {
            CleanupStatus::PartialFailure
        } else {
            CleanupStatus::Success
        };
        Self {
            status,
            resource_type: kind,
            scope,
            dry_run: summary.dry_run,
            message: summary.message(),
            summary,
            error: None,
        }
    }

    /// Builds a report for a kind that cannot be enumerated.
    #[must_use]
    pub fn not_implemented(
        kind: ResourceKind,
        scope: Scope,
        dry_run: bool,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            status: CleanupStatus::NotImplemented,
            resource_type: kind,
            scope,
            dry_run,
            summary: CleanupSummary::new(dry_run),
            message: reason.into(),
            error: None,
        }
    }

    /// Builds a report for a scan that failed as a whole.
    #[must_use]
    pub fn failed(kind: ResourceKind, scope: Scope, dry_run: bool, error: &crate::Error) -> Self {
        Self {
            status: CleanupStatus::Error,
            resource_type: kind,
            scope,
            dry_run,
            summary: CleanupSummary::new(dry_run),
            message: format!("Failed to cleanup {kind}: {error}"),
            error: Some(error.to_string()),
        }
    }
}

/// Report combining several resource kinds.
#[derive(Debug, Clone, Serialize)]
pub struct CombinedCleanupReport {
    /// Overall status.
    pub status: CleanupStatus,
    /// Whether deletions were simulated.
    pub dry_run: bool,
    /// Field-wise sum of every kind's summary.
    pub summary: CleanupSummary,
    /// Per-kind reports.
    pub by_resource_type: BTreeMap<ResourceKind, CleanupReport>,
    /// Human-readable outcome.
    pub message: String,
}

impl CombinedCleanupReport {
    /// Combines per-kind reports.
    ///
    /// The success rate is recomputed from the summed totals. Overall status
    /// is `error` when every enumerable kind errored, `partial_failure` when
    /// any kind errored or had failed deletions, and `success` otherwise.
    /// Kinds reporting `not_implemented` do not affect the status.
    #[must_use]
    pub fn from_reports(reports: Vec<CleanupReport>, dry_run: bool) -> Self {
        let summary: CleanupSummary = reports
            .iter()
            .map(|report| report.summary.clone())
            .sum::<CleanupSummary>()
            .combine(CleanupSummary::new(dry_run));

        let considered: Vec<CleanupStatus> = reports
            .iter()
            .map(|report| report.status)
            .filter(|status| *status != CleanupStatus::NotImplemented)
            .collect();
        let status = if !considered.is_empty()
            && considered.iter().all(|s| *s == CleanupStatus::Error)
        {
            CleanupStatus::Error
        } else if considered
            .iter()
            .any(|s| matches!(s, CleanupStatus::Error | CleanupStatus::PartialFailure))
        {
            CleanupStatus::PartialFailure
        } else {
            CleanupStatus::Success
        };

        let message = summary.message();
        let by_resource_type = reports
            .into_iter()
            .map(|report| (report.resource_type, report))
            .collect();

        Self {
            status,
            dry_run,
            summary,
            by_resource_type,
            message,
        }
    }
}
