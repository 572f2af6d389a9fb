//! Data models for cloudreap.
//!
//! Resource descriptors, the lifecycle label schema, and the report types
//! produced by cleanup and forecast runs.

mod cleanup;
mod forecast;
mod labels;
mod resource;

pub use cleanup::{
    CleanupReport, CleanupStatus, CleanupSummary, CombinedCleanupReport, FailedResource,
    SuccessRate,
};
pub use forecast::{
    ExpirationForecast, ExpirationForecastEntry, PermanentResourceEntry, UNKNOWN_OWNER,
};
pub use labels::{
    CREATED_AT_KEY, MANAGED_BY_KEY, MANAGED_BY_VALUE, MAX_LABEL_LENGTH, MAX_LABELS, OWNER_KEY,
    ResourceLabels, TTL_KEY, is_immutable_key, sanitize_label,
};
pub use resource::{LabelMap, ResourceDescriptor, ResourceKind, Scope};
