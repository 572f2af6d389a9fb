//! Resource lifecycle engine.
//!
//! Label policy at creation, TTL parsing, expiration decisions, cleanup runs,
//! and expiration forecasts.
//!
//! # Components
//!
//! - [`LabelPolicy`]: builds and merges the label set attached at creation
//! - [`parse_ttl`] / [`parse_created_at`]: pure label parsing
//! - [`ExpirationEvaluator`]: ordered expired/not-expired decision
//! - [`CleanupOrchestrator`]: scan-evaluate-delete per resource kind
//! - [`ExpirationForecaster`]: upcoming expirations and permanent resources
//!
//! # Example
//!
//! ```rust,ignore
//! use cloudreap::lifecycle::{ExpirationEvaluator, LabelPolicy};
//! use chrono::Utc;
//!
//! let labels = LabelPolicy::new("platform", "7d").merge_labels(None, Some("24h"));
//! let evaluation = ExpirationEvaluator::new().evaluate(Some(&labels.to_map()), Utc::now());
//! assert!(!evaluation.is_expired());
//! ```

mod clock;
mod evaluator;
mod forecast;
mod labels;
mod orchestrator;
mod ttl;

pub use clock::{Clock, FixedClock, SystemClock};
pub use evaluator::{Evaluation, ExpirationEvaluator, Timing, days_and_hours};
pub use forecast::{DEFAULT_FORECAST_DAYS, ExpirationForecaster};
pub use labels::{DEFAULT_OWNER, DEFAULT_TTL, LabelPolicy};
pub use orchestrator::CleanupOrchestrator;
pub use ttl::{
    CREATED_AT_FORMAT, NEVER, Ttl, format_created_at, is_valid_ttl, parse_created_at, parse_ttl,
};
