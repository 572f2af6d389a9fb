//! Creation-time label policy.

use super::{Clock, SystemClock, is_valid_ttl};
use crate::models::{LabelMap, ResourceLabels};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Default TTL applied when the caller does not supply one.
pub const DEFAULT_TTL: &str = "7d";

/// Owner recorded when none is configured.
pub const DEFAULT_OWNER: &str = "unassigned";

/// Builds the lifecycle label set attached to every new resource.
#[derive(Clone)]
pub struct LabelPolicy {
    owner: String,
    default_ttl: String,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for LabelPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelPolicy")
            .field("owner", &self.owner)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl Default for LabelPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_OWNER, DEFAULT_TTL)
    }
}

impl LabelPolicy {
    /// Creates a policy using the system clock.
    #[must_use]
    pub fn new(owner: impl Into<String>, default_ttl: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            default_ttl: default_ttl.into(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used to stamp `created-at`.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the configured default TTL.
    #[must_use]
    pub fn default_ttl(&self) -> &str {
        &self.default_ttl
    }

    /// Returns the reserved labels stamped at `now`.
    #[must_use]
    pub fn default_labels(&self, now: DateTime<Utc>) -> ResourceLabels {
        ResourceLabels::new(&self.owner, now, self.default_ttl.clone())
    }

    /// Merges user labels over the defaults.
    ///
    /// A non-empty `ttl_override` replaces the default TTL without
    /// validation. User entries are sanitized and applied after that, so a
    /// user `ttl` or `owner` wins, while `managed-by` and `created-at` are
    /// never overwritten.
    #[must_use]
    pub fn merge_labels(
        &self,
        user_labels: Option<&LabelMap>,
        ttl_override: Option<&str>,
    ) -> ResourceLabels {
        let mut labels = self.default_labels(self.clock.now());

        if let Some(ttl) = ttl_override.filter(|ttl| !ttl.is_empty()) {
            labels = labels.with_ttl(ttl);
        }

        user_labels
            .into_iter()
            .flatten()
            .fold(labels, |labels, (key, value)| labels.with_label(key, value))
    }

    /// Returns true if `ttl` would be accepted by the evaluator.
    #[must_use]
    pub fn validate_ttl(ttl: &str) -> bool {
        is_valid_ttl(ttl)
    }
}
