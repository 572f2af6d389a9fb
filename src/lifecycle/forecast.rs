//! Expiration forecasting.
//!
//! Scans like a cleanup run but projects forward instead of deleting.

use super::{Clock, Evaluation, ExpirationEvaluator, days_and_hours};
use crate::models::{
    CREATED_AT_KEY, ExpirationForecast, ExpirationForecastEntry, OWNER_KEY,
    PermanentResourceEntry, ResourceKind, Scope, TTL_KEY, UNKNOWN_OWNER,
};
use crate::providers::{ResourceProvider, list_all};
use crate::{Error, Result};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Default forecast horizon in days.
pub const DEFAULT_FORECAST_DAYS: u32 = 7;

/// Lists resources that will expire within a horizon.
#[derive(Clone)]
pub struct ExpirationForecaster {
    providers: HashMap<ResourceKind, Arc<dyn ResourceProvider>>,
    evaluator: ExpirationEvaluator,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ExpirationForecaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpirationForecaster")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ExpirationForecaster {
    /// Creates a forecaster with no providers.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            providers: HashMap::new(),
            evaluator: ExpirationEvaluator::new(),
            clock,
        }
    }

    /// Registers a provider under its own kind.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn ResourceProvider>) -> Self {
        self.providers.insert(provider.kind(), provider);
        self
    }

    /// Forecasts expirations within `horizon_days` of now.
    ///
    /// Unmanaged resources and resources missing `created-at` or `ttl` are
    /// skipped silently; unparsable labels are logged and skipped. `ttl=never`
    /// resources go to the permanent bucket. A resource is included iff
    /// `now <= expires_at <= now + horizon`; entries are sorted soonest first,
    /// ties broken by name.
    ///
    /// # Errors
    ///
    /// - [`Error::NotImplemented`] if no provider can enumerate `kind`.
    /// - [`Error::ProviderFailure`] if the listing fails.
    #[instrument(
        name = "cloudreap.forecast",
        skip(self),
        fields(component = "lifecycle", operation = "forecast", kind = %kind, scope = %scope)
    )]
    pub async fn forecast(
        &self,
        kind: ResourceKind,
        scope: &Scope,
        horizon_days: u32,
    ) -> Result<ExpirationForecast> {
        let provider = self
            .providers
            .get(&kind)
            .ok_or_else(|| Error::NotImplemented(format!("Listing {kind} is not implemented")))?;

        let resources = list_all(provider.as_ref(), scope).await?;
        let now = self.clock.now();
        let threshold = horizon_end(now, horizon_days);

        let mut expiring = Vec::new();
        let mut permanent = Vec::new();

        for resource in resources {
            match self.evaluator.evaluate(resource.labels.as_ref(), now) {
                Evaluation::Skipped(Error::NotManaged | Error::MissingLabel { .. }) => {},
                Evaluation::Skipped(reason) => {
                    warn!(resource = %resource.name, reason = %reason, "Skipping resource with unparsable lifecycle labels");
                },
                Evaluation::Permanent => {
                    permanent.push(PermanentResourceEntry {
                        scope: scope.clone(),
                        ttl: resource.label(TTL_KEY).unwrap_or_default().to_string(),
                        created_at: resource.label(CREATED_AT_KEY).unwrap_or_default().to_string(),
                        status: resource.status,
                        name: resource.name,
                    });
                },
                Evaluation::Expired(timing) | Evaluation::Active(timing) => {
                    if timing.expires_at < now || timing.expires_at > threshold {
                        debug!(resource = %resource.name, expires_at = %timing.expires_at, "Outside forecast window");
                        continue;
                    }
                    let (days, hours) = days_and_hours(timing.expires_at - now);
                    expiring.push(ExpirationForecastEntry {
                        scope: scope.clone(),
                        created_at: timing.created_at,
                        ttl: resource.label(TTL_KEY).unwrap_or_default().to_string(),
                        expires_at: timing.expires_at,
                        days_until_expiration: days,
                        hours_until_expiration: days * 24 + hours,
                        owner: resource.label(OWNER_KEY).unwrap_or(UNKNOWN_OWNER).to_string(),
                        status: resource.status,
                        name: resource.name,
                    });
                },
            }
        }

        expiring.sort_by(|a, b| {
            a.expires_at
                .cmp(&b.expires_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        permanent.sort_by(|a, b| a.name.cmp(&b.name));

        metrics::counter!("forecast_runs_total", "kind" => kind.as_str()).increment(1);
        info!(
            expiring = expiring.len(),
            permanent = permanent.len(),
            horizon_days,
            "Expiration forecast completed"
        );

        Ok(ExpirationForecast::new(
            kind,
            scope.clone(),
            horizon_days,
            expiring,
            permanent,
        ))
    }
}

/// `now + days`, saturating at chrono's maximum instant.
fn horizon_end(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    TimeDelta::try_days(i64::from(days))
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
