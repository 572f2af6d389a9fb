//! Expiration decisions.
//!
//! Rules are applied in a fixed order and the first match wins:
//!
//! 1. `managed-by` is not `mcp` (or there are no labels) - skipped
//! 2. `created-at` is missing - skipped
//! 3. `ttl` is missing - skipped
//! 4. `ttl` does not parse - skipped
//! 5. `ttl` is `never` - permanent
//! 6. `created-at` does not parse - skipped
//! 7. expired iff `now >= created-at + ttl`
//!
//! Anything ambiguous is treated as not expired; a malformed label never
//! causes a deletion.

use super::{Ttl, parse_created_at, parse_ttl};
use crate::Error;
use crate::models::{CREATED_AT_KEY, LabelMap, MANAGED_BY_KEY, MANAGED_BY_VALUE, TTL_KEY};
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_HOUR: i64 = 3_600;

/// Splits a duration into whole days and remainder hours.
///
/// Both parts truncate toward zero, so a negative duration yields
/// non-positive parts.
#[must_use]
pub fn days_and_hours(delta: TimeDelta) -> (i64, i64) {
    let seconds = delta.num_seconds();
    let days = seconds / SECONDS_PER_DAY;
    let hours = (seconds % SECONDS_PER_DAY) / SECONDS_PER_HOUR;
    (days, hours)
}

/// Timing details of a resource with a finite TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Parsed `created-at`.
    pub created_at: DateTime<Utc>,
    /// Parsed TTL.
    pub ttl: TimeDelta,
    /// `created_at + ttl`.
    pub expires_at: DateTime<Utc>,
    /// `now - created_at`.
    pub age: TimeDelta,
    /// `expires_at - now`; negative once expired.
    pub remaining: TimeDelta,
}

/// Outcome of evaluating one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// The TTL has elapsed.
    Expired(Timing),
    /// The TTL has not elapsed yet.
    Active(Timing),
    /// `ttl=never`.
    Permanent,
    /// Not eligible for a decision; carries the reason.
    Skipped(Error),
}

impl Evaluation {
    /// Returns true only for [`Evaluation::Expired`].
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        matches!(self, Self::Expired(_))
    }

    /// Returns timing details for finite-TTL resources.
    #[must_use]
    pub const fn timing(&self) -> Option<&Timing> {
        match self {
            Self::Expired(timing) | Self::Active(timing) => Some(timing),
            Self::Permanent | Self::Skipped(_) => None,
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expired(t) => {
                let (age_d, age_h) = days_and_hours(t.age);
                let (over_d, over_h) = days_and_hours(-t.remaining);
                write!(
                    f,
                    "expired: age {age_d}d {age_h}h, expired {over_d}d {over_h}h ago (ttl {})",
                    Ttl::Finite(t.ttl)
                )
            },
            Self::Active(t) => {
                let (age_d, age_h) = days_and_hours(t.age);
                let (left_d, left_h) = days_and_hours(t.remaining);
                write!(
                    f,
                    "active: age {age_d}d {age_h}h, expires in {left_d}d {left_h}h (ttl {})",
                    Ttl::Finite(t.ttl)
                )
            },
            Self::Permanent => write!(f, "permanent resource (ttl=never)"),
            Self::Skipped(reason) => write!(f, "{reason}"),
        }
    }
}

/// Decides whether resources have expired.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpirationEvaluator;

impl ExpirationEvaluator {
    /// Creates an evaluator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Evaluates a label set at `now`.
    #[must_use]
    pub fn evaluate(&self, labels: Option<&LabelMap>, now: DateTime<Utc>) -> Evaluation {
        let Some(labels) = labels else {
            return Evaluation::Skipped(Error::NotManaged);
        };

        if labels.get(MANAGED_BY_KEY).map(String::as_str) != Some(MANAGED_BY_VALUE) {
            return Evaluation::Skipped(Error::NotManaged);
        }

        let Some(created_raw) = labels.get(CREATED_AT_KEY) else {
            return missing(CREATED_AT_KEY);
        };
        let Some(ttl_raw) = labels.get(TTL_KEY) else {
            return missing(TTL_KEY);
        };

        let ttl = match parse_ttl(ttl_raw) {
            Ok(Ttl::Never) => return Evaluation::Permanent,
            Ok(Ttl::Finite(ttl)) => ttl,
            Err(e) => return Evaluation::Skipped(e),
        };

        let created_at = match parse_created_at(created_raw) {
            Ok(created_at) => created_at,
            Err(e) => return Evaluation::Skipped(e),
        };

        let Some(expires_at) = created_at.checked_add_signed(ttl) else {
            return Evaluation::Skipped(Error::InvalidTtlFormat {
                value: ttl_raw.clone(),
            });
        };

        let timing = Timing {
            created_at,
            ttl,
            expires_at,
            age: now - created_at,
            remaining: expires_at - now,
        };

        if now >= expires_at {
            Evaluation::Expired(timing)
        } else {
            Evaluation::Active(timing)
        }
    }
}

fn missing(key: &str) -> Evaluation {
    Evaluation::Skipped(Error::MissingLabel {
        key: key.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0)
            .single()
            .expect("valid date")
    }

    fn labels(pairs: &[(&str, &str)]) -> LabelMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn managed(created_at: &str, ttl: &str) -> LabelMap {
        labels(&[
            ("managed-by", "mcp"),
            ("created-at", created_at),
            ("ttl", ttl),
        ])
    }

    #[test]
    fn test_no_labels_not_managed() {
        let eval = ExpirationEvaluator::new().evaluate(None, now());
        assert_eq!(eval, Evaluation::Skipped(Error::NotManaged));
        assert_eq!(eval.to_string(), "not MCP-managed");
    }

    #[test]
    fn test_other_manager_not_managed() {
        let map = labels(&[
            ("managed-by", "terraform"),
            ("created-at", "20200101-000000"),
            ("ttl", "1h"),
        ]);
        let eval = ExpirationEvaluator::new().evaluate(Some(&map), now());
        assert_eq!(eval, Evaluation::Skipped(Error::NotManaged));
    }

    #[test]
    fn test_missing_created_at() {
        let map = labels(&[("managed-by", "mcp"), ("ttl", "1h")]);
        let eval = ExpirationEvaluator::new().evaluate(Some(&map), now());
        assert_eq!(eval.to_string(), "missing created-at label");
        assert!(!eval.is_expired());
    }

    #[test]
    fn test_missing_ttl() {
        let map = labels(&[("managed-by", "mcp"), ("created-at", "20200101-000000")]);
        let eval = ExpirationEvaluator::new().evaluate(Some(&map), now());
        assert_eq!(
            eval,
            Evaluation::Skipped(Error::MissingLabel {
                key: "ttl".to_string()
            })
        );
    }

    #[test]
    fn test_invalid_ttl_fails_open() {
        let map = managed("20200101-000000", "5x");
        let eval = ExpirationEvaluator::new().evaluate(Some(&map), now());
        assert!(!eval.is_expired());
        assert!(eval.to_string().contains("5x"));
    }

    #[test]
    fn test_never_is_permanent() {
        let map = managed("20000101-000000", "never");
        let eval = ExpirationEvaluator::new().evaluate(Some(&map), now());
        assert_eq!(eval, Evaluation::Permanent);
    }

    #[test]
    fn test_never_wins_over_bad_created_at() {
        let map = managed("yesterday", "NEVER");
        let eval = ExpirationEvaluator::new().evaluate(Some(&map), now());
        assert_eq!(eval, Evaluation::Permanent);
    }

    #[test]
    fn test_invalid_created_at() {
        let map = managed("2025-01-01", "7d");
        let eval = ExpirationEvaluator::new().evaluate(Some(&map), now());
        assert_eq!(
            eval,
            Evaluation::Skipped(Error::InvalidTimestampFormat {
                value: "2025-01-01".to_string()
            })
        );
    }

    #[test]
    fn test_expired_reason() {
        // Created 8d 2h before now with a 7d TTL.
        let map = managed("20250102-100000", "7d");
        let eval = ExpirationEvaluator::new().evaluate(Some(&map), now());
        assert!(eval.is_expired());
        assert_eq!(
            eval.to_string(),
            "expired: age 8d 2h, expired 1d 2h ago (ttl 7d)"
        );
    }

    #[test]
    fn test_active_reason() {
        // Created 2d before now with a 7d TTL.
        let map = managed("20250108-120000", "7d");
        let eval = ExpirationEvaluator::new().evaluate(Some(&map), now());
        assert!(!eval.is_expired());
        assert_eq!(
            eval.to_string(),
            "active: age 2d 0h, expires in 5d 0h (ttl 7d)"
        );
    }

    #[test]
    fn test_expired_at_exact_boundary() {
        let map = managed("20250110-110000", "1h");
        let eval = ExpirationEvaluator::new().evaluate(Some(&map), now());
        assert!(eval.is_expired());

        let one_second_before = now() - TimeDelta::seconds(1);
        let eval = ExpirationEvaluator::new().evaluate(Some(&map), one_second_before);
        assert!(!eval.is_expired());
    }

    #[test]
    fn test_future_created_at_is_active() {
        let map = managed("20250111-000000", "1h");
        let eval = ExpirationEvaluator::new().evaluate(Some(&map), now());
        let timing = eval.timing().expect("finite ttl");
        assert!(!eval.is_expired());
        assert!(timing.age < TimeDelta::zero());
    }

    #[test]
    fn test_days_and_hours() {
        assert_eq!(days_and_hours(TimeDelta::hours(50)), (2, 2));
        assert_eq!(days_and_hours(TimeDelta::minutes(59)), (0, 0));
        assert_eq!(days_and_hours(TimeDelta::hours(-30)), (-1, -6));
    }
}
