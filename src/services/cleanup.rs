//! Cleanup and forecast operations.

use crate::config::CloudreapConfig;
use crate::lifecycle::{
    CleanupOrchestrator, Clock, DEFAULT_FORECAST_DAYS, ExpirationForecaster, LabelPolicy,
    SystemClock,
};
use crate::models::{
    CleanupReport, CombinedCleanupReport, ExpirationForecast, LabelMap, ResourceKind,
    ResourceLabels, Scope,
};
use crate::providers::{GcloudCliProvider, ResourceProvider};
use std::sync::Arc;
use tracing::instrument;

/// Entry point for every lifecycle operation.
///
/// Resolves omitted zones and regions from configuration and delegates to
/// the orchestrator and forecaster. Every operation returns a structured
/// report; failures are carried inside it.
#[derive(Debug, Clone)]
pub struct CleanupService {
    config: CloudreapConfig,
    policy: LabelPolicy,
    orchestrator: CleanupOrchestrator,
    forecaster: ExpirationForecaster,
}

impl CleanupService {
    /// Creates a service with explicit providers and clock.
    #[must_use]
    pub fn new(
        config: CloudreapConfig,
        providers: Vec<Arc<dyn ResourceProvider>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let policy = LabelPolicy::new(config.owner.clone(), config.default_ttl.clone())
            .with_clock(Arc::clone(&clock));

        let mut orchestrator = CleanupOrchestrator::new(Arc::clone(&clock));
        let mut forecaster = ExpirationForecaster::new(clock);
        for provider in providers {
            orchestrator = orchestrator.with_provider(Arc::clone(&provider));
            forecaster = forecaster.with_provider(provider);
        }

        Self {
            config,
            policy,
            orchestrator,
            forecaster,
        }
    }

    /// Creates a service backed by the `gcloud` CLI for every kind.
    #[must_use]
    pub fn from_config(config: CloudreapConfig) -> Self {
        let providers: Vec<Arc<dyn ResourceProvider>> = ResourceKind::all()
            .iter()
            .map(|kind| {
                Arc::new(GcloudCliProvider::new(*kind, config.gcloud.clone()))
                    as Arc<dyn ResourceProvider>
            })
            .collect();
        Self::new(config, providers, Arc::new(SystemClock))
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &CloudreapConfig {
        &self.config
    }

    /// Returns the label policy.
    #[must_use]
    pub const fn label_policy(&self) -> &LabelPolicy {
        &self.policy
    }

    fn zone(&self, zone: Option<&str>) -> Scope {
        Scope::zone(resolve(zone, &self.config.default_zone))
    }

    fn region(&self, region: Option<&str>) -> Scope {
        Scope::region(resolve(region, &self.config.region))
    }

    /// Deletes expired compute instances in `zone` (default zone if omitted).
    #[instrument(name = "cloudreap.service.cleanup_instances", skip(self))]
    pub async fn cleanup_expired_instances(
        &self,
        zone: Option<&str>,
        dry_run: bool,
    ) -> CleanupReport {
        let scope = self.zone(zone);
        self.orchestrator
            .cleanup_by_kind(ResourceKind::ComputeInstance, &scope, dry_run)
            .await
    }

    /// Deletes expired Cloud Run services in `region` (default region if
    /// omitted).
    #[instrument(name = "cloudreap.service.cleanup_services", skip(self))]
    pub async fn cleanup_expired_services(
        &self,
        region: Option<&str>,
        dry_run: bool,
    ) -> CleanupReport {
        let scope = self.region(region);
        self.orchestrator
            .cleanup_by_kind(ResourceKind::CloudRunService, &scope, dry_run)
            .await
    }

    /// Cleans every supported kind and combines the results.
    #[instrument(name = "cloudreap.service.cleanup_all", skip(self))]
    pub async fn cleanup_all_expired_resources(
        &self,
        zone: Option<&str>,
        region: Option<&str>,
        dry_run: bool,
    ) -> CombinedCleanupReport {
        let targets = [
            (ResourceKind::ComputeInstance, self.zone(zone)),
            (ResourceKind::CloudRunService, self.region(region)),
        ];
        self.orchestrator.cleanup_all_kinds(&targets, dry_run).await
    }

    /// Lists compute instances in `zone` that expire within `days` (7 if
    /// omitted), plus the permanent ones.
    #[instrument(name = "cloudreap.service.list_expiring", skip(self))]
    pub async fn list_expiring_resources(
        &self,
        zone: Option<&str>,
        days: Option<u32>,
    ) -> ExpirationForecast {
        let scope = self.zone(zone);
        let days = days.unwrap_or(DEFAULT_FORECAST_DAYS);
        match self
            .forecaster
            .forecast(ResourceKind::ComputeInstance, &scope, days)
            .await
        {
            Ok(forecast) => forecast,
            Err(e) => {
                tracing::error!(error = %e, "Expiration forecast failed");
                ExpirationForecast::failed(ResourceKind::ComputeInstance, scope, days, &e)
            },
        }
    }

    /// Builds the label set a new resource would receive.
    #[must_use]
    pub fn generate_labels(
        &self,
        user_labels: Option<&LabelMap>,
        ttl: Option<&str>,
    ) -> ResourceLabels {
        self.policy.merge_labels(user_labels, ttl)
    }
}

fn resolve<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::lifecycle::FixedClock;
    use crate::models::{CleanupStatus, ResourceDescriptor};
    use crate::providers::InMemoryProvider;
    use chrono::{DateTime, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
            .single()
            .expect("valid date")
    }

    fn managed(kind: ResourceKind, name: &str, created_at: &str, ttl: &str) -> ResourceDescriptor {
        let labels: LabelMap = [
            ("managed-by", "mcp"),
            ("created-at", created_at),
            ("ttl", ttl),
        ]
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
        ResourceDescriptor::new(kind, name, "RUNNING").with_labels(labels)
    }

    fn service() -> (CleanupService, Arc<InMemoryProvider>, Arc<InMemoryProvider>) {
        let instances = Arc::new(InMemoryProvider::new(ResourceKind::ComputeInstance));
        let services = Arc::new(InMemoryProvider::new(ResourceKind::CloudRunService));
        let config = CloudreapConfig::default().with_owner("platform");
        let svc = CleanupService::new(
            config,
            vec![
                Arc::clone(&instances) as Arc<dyn ResourceProvider>,
                Arc::clone(&services) as Arc<dyn ResourceProvider>,
            ],
            Arc::new(FixedClock::new(now())),
        );
        (svc, instances, services)
    }

    #[test]
    fn test_resolve() {
        assert_eq!(resolve(Some("europe-west1-b"), "us-central1-a"), "europe-west1-b");
        assert_eq!(resolve(Some("  "), "us-central1-a"), "us-central1-a");
        assert_eq!(resolve(None, "us-central1-a"), "us-central1-a");
    }

    #[tokio::test]
    async fn test_instances_use_default_zone() {
        let (svc, instances, _) = service();
        let zone = Scope::zone("us-central1-a");
        instances
            .insert(
                &zone,
                managed(ResourceKind::ComputeInstance, "old", "20250101-000000", "1d"),
            )
            .expect("insert");

        let report = svc.cleanup_expired_instances(None, false).await;
        assert_eq!(report.status, CleanupStatus::Success);
        assert_eq!(report.scope, zone);
        assert_eq!(report.summary.deleted_resources, vec!["old".to_string()]);
        assert!(!instances.contains(&zone, "old").expect("contains"));
    }

    #[tokio::test]
    async fn test_services_use_explicit_region() {
        let (svc, _, services) = service();
        let region = Scope::region("europe-west4");
        services
            .insert(
                &region,
                managed(ResourceKind::CloudRunService, "api", "20250101-000000", "1h"),
            )
            .expect("insert");

        let report = svc.cleanup_expired_services(Some("europe-west4"), true).await;
        assert!(report.dry_run);
        assert_eq!(report.summary.deleted_count, 1);
        assert!(services.contains(&region, "api").expect("contains"));
    }

    #[tokio::test]
    async fn test_cleanup_all_reports_both_kinds() {
        let (svc, _, services) = service();
        services
            .fail_listing(Some(Error::NotImplemented(
                "Cloud Run listing unavailable".to_string(),
            )))
            .expect("inject");

        let combined = svc.cleanup_all_expired_resources(None, None, false).await;
        assert_eq!(combined.by_resource_type.len(), 2);
        assert_eq!(
            combined.by_resource_type[&ResourceKind::CloudRunService].status,
            CleanupStatus::NotImplemented
        );
        assert_eq!(combined.status, CleanupStatus::Success);
    }

    #[tokio::test]
    async fn test_list_expiring_defaults_to_seven_days() {
        let (svc, instances, _) = service();
        let zone = Scope::zone("us-central1-a");
        instances
            .insert(
                &zone,
                managed(ResourceKind::ComputeInstance, "soon", "20250301-000000", "3d"),
            )
            .expect("insert");

        let forecast = svc.list_expiring_resources(None, None).await;
        assert_eq!(forecast.days_threshold, 7);
        assert_eq!(forecast.expiring_soon_count, 1);
    }

    #[tokio::test]
    async fn test_list_expiring_failure_is_reported() {
        let (svc, instances, _) = service();
        instances
            .fail_listing(Some(Error::ProviderFailure {
                operation: "list".to_string(),
                cause: "permission denied".to_string(),
            }))
            .expect("inject");

        let forecast = svc.list_expiring_resources(Some("z"), Some(3)).await;
        assert_eq!(forecast.status, CleanupStatus::Error);
        assert!(
            forecast
                .error
                .as_deref()
                .is_some_and(|e| e.contains("permission denied"))
        );
    }

    #[test]
    fn test_generate_labels_uses_config_owner() {
        let (svc, _, _) = service();
        let labels = svc.generate_labels(None, Some("24h"));
        assert_eq!(labels.owner(), "platform");
        assert_eq!(labels.ttl(), "24h");
        assert_eq!(labels.created_at(), now());
    }
}
