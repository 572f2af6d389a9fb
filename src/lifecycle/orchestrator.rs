//! Scan-evaluate-delete cleanup runs.
//!
//! One run lists every resource of a kind in a scope, evaluates each against
//! a single `now` snapshot, and deletes the expired ones. A failed deletion
//! is recorded and the run moves on; only a failed listing aborts the run.
//!
//! # Example
//!
//! ```rust,ignore
//! use cloudreap::{CleanupOrchestrator, InMemoryProvider, ResourceKind, Scope, SystemClock};
//! use std::sync::Arc;
//!
//! let orchestrator = CleanupOrchestrator::new(Arc::new(SystemClock))
//!     .with_provider(Arc::new(InMemoryProvider::new(ResourceKind::ComputeInstance)));
//!
//! // Preview, then delete.
//! let preview = orchestrator
//!     .cleanup_by_kind(ResourceKind::ComputeInstance, &Scope::zone("us-central1-a"), true)
//!     .await;
//! println!("{}", preview.message);
//! ```

use super::{Clock, Evaluation, ExpirationEvaluator};
use crate::Error;
use crate::models::{
    CleanupReport, CleanupSummary, CombinedCleanupReport, ResourceKind, Scope,
};
use crate::providers::{ResourceProvider, repeated_token};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Converts Duration to milliseconds as f64 for metrics.
#[inline]
fn duration_to_millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Converts usize to u64 for metric counters.
#[inline]
fn usize_to_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// Drives cleanup runs over registered providers.
#[derive(Clone)]
pub struct CleanupOrchestrator {
    providers: HashMap<ResourceKind, Arc<dyn ResourceProvider>>,
    evaluator: ExpirationEvaluator,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CleanupOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupOrchestrator")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl CleanupOrchestrator {
    /// Creates an orchestrator with no providers.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            providers: HashMap::new(),
            evaluator: ExpirationEvaluator::new(),
            clock,
        }
    }

    /// Registers a provider under its own kind, replacing any previous one.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn ResourceProvider>) -> Self {
        self.providers.insert(provider.kind(), provider);
        self
    }

    /// Returns the provider registered for `kind`.
    #[must_use]
    pub fn provider(&self, kind: ResourceKind) -> Option<&Arc<dyn ResourceProvider>> {
        self.providers.get(&kind)
    }

    /// Cleans up expired resources of one kind in one scope.
    ///
    /// Never fails: listing errors become an `error` report, a missing or
    /// non-enumerable provider becomes `not_implemented`, and deletion errors
    /// are recorded per resource. In dry-run mode the provider's `delete` is
    /// never called and would-be deletions are counted as deleted.
    #[instrument(
        name = "cloudreap.cleanup.kind",
        skip(self),
        fields(
            run_id = %uuid::Uuid::new_v4(),
            component = "lifecycle",
            operation = "cleanup",
            kind = %kind,
            scope = %scope,
            dry_run = dry_run
        )
    )]
    pub async fn cleanup_by_kind(
        &self,
        kind: ResourceKind,
        scope: &Scope,
        dry_run: bool,
    ) -> CleanupReport {
        let start = Instant::now();

        let Some(provider) = self.providers.get(&kind) else {
            debug!("No provider registered");
            return CleanupReport::not_implemented(
                kind,
                scope.clone(),
                dry_run,
                format!("Cleanup of {kind} is not implemented"),
            );
        };

        let now = self.clock.now();
        let mut summary = CleanupSummary::new(dry_run);
        let mut token: Option<String> = None;

        loop {
            let page = match provider.list_page(scope, token.as_deref()).await {
                Ok(page) => page,
                Err(Error::NotImplemented(reason)) => {
                    info!(reason = %reason, "Provider cannot enumerate resources");
                    return CleanupReport::not_implemented(kind, scope.clone(), dry_run, reason);
                },
                Err(e) => {
                    warn!(error = %e, scanned = summary.total_scanned, "Resource listing failed");
                    metrics::counter!("cleanup_list_failures_total", "kind" => kind.as_str())
                        .increment(1);
                    let mut report = CleanupReport::failed(kind, scope.clone(), dry_run, &e);
                    report.summary = summary;
                    return report;
                },
            };

            for resource in page.resources {
                summary.total_scanned += 1;
                let evaluation = self.evaluator.evaluate(resource.labels.as_ref(), now);

                match &evaluation {
                    Evaluation::Expired(_) => {},
                    Evaluation::Skipped(Error::NotManaged) => {
                        debug!(resource = %resource.name, "Skipping unmanaged resource");
                        continue;
                    },
                    Evaluation::Skipped(reason) => {
                        warn!(resource = %resource.name, reason = %reason, "Skipping resource with unusable lifecycle labels");
                        continue;
                    },
                    Evaluation::Active(_) | Evaluation::Permanent => {
                        debug!(resource = %resource.name, reason = %evaluation, "Resource not expired");
                        continue;
                    },
                }

                summary.expired_count += 1;

                if dry_run {
                    info!(resource = %resource.name, reason = %evaluation, "Would delete expired resource");
                    summary.record_deleted(resource.name);
                    continue;
                }

                match provider.delete(&resource.name, scope).await {
                    Ok(()) => {
                        info!(resource = %resource.name, reason = %evaluation, "Deleted expired resource");
                        summary.record_deleted(resource.name);
                    },
                    Err(e) => {
                        warn!(resource = %resource.name, error = %e, "Failed to delete expired resource");
                        summary.record_failed(resource.name, e.to_string());
                    },
                }
            }

            match page.next_page_token {
                Some(next) if token.as_deref() == Some(next.as_str()) => {
                    let e = repeated_token(&next);
                    let mut report = CleanupReport::failed(kind, scope.clone(), dry_run, &e);
                    report.summary = summary;
                    return report;
                },
                Some(next) => token = Some(next),
                None => break,
            }
        }

        let elapsed = start.elapsed();
        metrics::counter!(
            "cleanup_runs_total",
            "kind" => kind.as_str(),
            "dry_run" => dry_run.to_string()
        )
        .increment(1);
        if !dry_run {
            metrics::counter!("cleanup_resources_deleted_total", "kind" => kind.as_str())
                .increment(usize_to_u64(summary.deleted_count));
        }
        metrics::counter!("cleanup_resources_failed_total", "kind" => kind.as_str())
            .increment(usize_to_u64(summary.failed_count));
        metrics::histogram!("cleanup_duration_ms", "kind" => kind.as_str())
            .record(duration_to_millis(elapsed));

        info!(
            total_scanned = summary.total_scanned,
            expired = summary.expired_count,
            deleted = summary.deleted_count,
            failed = summary.failed_count,
            success_rate = %summary.success_rate(),
            duration_ms = duration_to_millis(elapsed),
            "Cleanup completed"
        );

        CleanupReport::completed(kind, scope.clone(), summary)
    }

    /// Cleans up several kinds concurrently and combines the results.
    ///
    /// Each kind is cleaned at most once; repeated kinds after the first are
    /// ignored. A failure in one kind never prevents the others from running.
    #[instrument(
        name = "cloudreap.cleanup.all",
        skip(self, targets),
        fields(component = "lifecycle", operation = "cleanup_all", kinds = targets.len(), dry_run = dry_run)
    )]
    pub async fn cleanup_all_kinds(
        &self,
        targets: &[(ResourceKind, Scope)],
        dry_run: bool,
    ) -> CombinedCleanupReport {
        let mut seen = HashSet::new();
        let runs = targets
            .iter()
            .filter(|(kind, _)| {
                let first = seen.insert(*kind);
                if !first {
                    warn!(kind = %kind, "Ignoring repeated resource kind");
                }
                first
            })
            .map(|(kind, scope)| self.cleanup_by_kind(*kind, scope, dry_run));

        let reports = join_all(runs).await;
        let combined = CombinedCleanupReport::from_reports(reports, dry_run);

        info!(
            status = %combined.status,
            deleted = combined.summary.deleted_count,
            failed = combined.summary.failed_count,
            success_rate = %combined.summary.success_rate(),
            "Combined cleanup completed"
        );

        combined
    }
}
