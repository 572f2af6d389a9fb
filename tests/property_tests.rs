//! Property-based tests for lifecycle invariants.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Unmanaged resources never expire
//! - Expiration is exactly `now >= created_at + ttl`
//! - `ttl=never` never expires
//! - Label sanitization stays inside the GCP alphabet and is idempotent
//! - User labels cannot overwrite `managed-by` or `created-at`
//! - Summary combination is commutative and associative

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use cloudreap::lifecycle::{format_created_at, parse_ttl};
use cloudreap::models::{LabelMap, MAX_LABEL_LENGTH, sanitize_label};
use cloudreap::{CleanupSummary, ExpirationEvaluator, FixedClock, LabelPolicy};
use proptest::prelude::*;
use std::sync::Arc;

/// 2020-01-01T00:00:00Z
const EPOCH_2020: i64 = 1_577_836_800;

fn instant(offset_secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(EPOCH_2020 + offset_secs, 0)
        .single()
        .expect("valid instant")
}

fn lifecycle_labels(managed_by: &str, created_at: DateTime<Utc>, ttl: &str) -> LabelMap {
    [
        ("managed-by", managed_by.to_string()),
        ("created-at", format_created_at(created_at)),
        ("ttl", ttl.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn summary_strategy() -> impl Strategy<Value = CleanupSummary> {
    (
        prop::collection::vec("[a-z]{1,8}", 0..4),
        prop::collection::vec(("[a-z]{1,8}", "[a-z ]{0,12}"), 0..3),
        0usize..5,
        any::<bool>(),
    )
        .prop_map(|(deleted, failed, unexpired, dry_run)| {
            let mut summary = CleanupSummary::new(dry_run);
            for name in deleted {
                summary.record_deleted(name);
            }
            for (name, error) in failed {
                summary.record_failed(name, error);
            }
            summary.expired_count = summary.deleted_count + summary.failed_count;
            summary.total_scanned = summary.expired_count + unexpired;
            summary.deleted_resources.sort();
            summary.failed_resources.sort();
            summary
        })
}

// ============================================================================
// Expiration Evaluation
// ============================================================================

proptest! {
    /// Property: anything other than `managed-by=mcp` is never expired.
    #[test]
    fn prop_unmanaged_never_expires(
        managed_by in "[a-z]{0,10}".prop_filter("must not be mcp", |v| v != "mcp"),
        age_hours in 0i64..100_000,
    ) {
        let created = instant(0);
        let labels = lifecycle_labels(&managed_by, created, "1h");
        let evaluation = ExpirationEvaluator::new()
            .evaluate(Some(&labels), created + TimeDelta::hours(age_hours));
        prop_assert!(!evaluation.is_expired());
    }

    /// Property: a managed resource is expired iff `now >= created_at + ttl`.
    #[test]
    fn prop_expired_iff_past_deadline(
        created_offset in 0i64..200_000_000,
        ttl_hours in 1i64..20_000,
        now_offset in -100_000_000i64..100_000_000,
    ) {
        let created = instant(created_offset);
        let ttl = format!("{ttl_hours}h");
        let now = created + TimeDelta::hours(ttl_hours) + TimeDelta::seconds(now_offset);
        let labels = lifecycle_labels("mcp", created, &ttl);

        let expired = ExpirationEvaluator::new().evaluate(Some(&labels), now).is_expired();
        prop_assert_eq!(expired, now_offset >= 0);
    }

    /// Property: `ttl=never` is never expired regardless of age.
    #[test]
    fn prop_never_ttl_never_expires(age_days in 0i64..100_000) {
        let created = instant(0);
        let labels = lifecycle_labels("mcp", created, "never");
        let evaluation = ExpirationEvaluator::new()
            .evaluate(Some(&labels), created + TimeDelta::days(age_days));
        prop_assert!(!evaluation.is_expired());
    }

    /// Property: day TTLs equal 24 times the same count in hours.
    #[test]
    fn prop_days_are_24_hours(n in 0i64..10_000) {
        let days = parse_ttl(&format!("{n}d")).expect("days parse");
        let hours = parse_ttl(&format!("{}h", n * 24)).expect("hours parse");
        prop_assert_eq!(days, hours);
    }

    /// Property: anything outside the TTL grammar is rejected.
    #[test]
    fn prop_bad_ttl_rejected(n in 0u32..1000, unit in "[a-ce-gi-zA-CE-GI-Z]") {
        let candidate = format!("{n}{unit}");
        prop_assert!(parse_ttl(&candidate).is_err());
        prop_assert!(!LabelPolicy::validate_ttl(&candidate));
    }
}

// ============================================================================
// Label Sanitization and Merging
// ============================================================================

proptest! {
    /// Property: sanitized labels only contain `[a-z0-9-]` and fit the length cap.
    #[test]
    fn prop_sanitized_alphabet_and_length(raw in "\\PC{0,120}") {
        let sanitized = sanitize_label(&raw);
        prop_assert!(sanitized.chars().count() <= MAX_LABEL_LENGTH);
        prop_assert!(sanitized
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }

    /// Property: sanitization is idempotent.
    #[test]
    fn prop_sanitize_idempotent(raw in "\\PC{0,120}") {
        let once = sanitize_label(&raw);
        prop_assert_eq!(sanitize_label(&once), once);
    }

    /// Property: user labels never change `managed-by` or `created-at`.
    #[test]
    fn prop_immutable_labels_survive_merge(
        user in prop::collection::btree_map("[A-Za-z_.-]{1,12}", "[A-Za-z0-9_.@ -]{0,20}", 0..10),
        forged_created_at in "[0-9]{8}-[0-9]{6}",
        forged_manager in "[a-z]{1,8}",
    ) {
        let now = instant(123_456);
        let policy = LabelPolicy::new("ops", "7d").with_clock(Arc::new(FixedClock::new(now)));

        let mut user: LabelMap = user.into_iter().collect();
        user.insert("managed-by".to_string(), forged_manager);
        user.insert("Created_At".to_string(), forged_created_at);

        let labels = policy.merge_labels(Some(&user), None).to_map();
        prop_assert_eq!(labels.get("managed-by").map(String::as_str), Some("mcp"));
        prop_assert_eq!(labels.get("created-at"), Some(&format_created_at(now)));
    }
}

// ============================================================================
// Summary Combination
// ============================================================================

proptest! {
    /// Property: `combine` is commutative.
    #[test]
    fn prop_combine_commutative(a in summary_strategy(), b in summary_strategy()) {
        prop_assert_eq!(a.clone().combine(b.clone()), b.combine(a));
    }

    /// Property: `combine` is associative.
    #[test]
    fn prop_combine_associative(
        a in summary_strategy(),
        b in summary_strategy(),
        c in summary_strategy(),
    ) {
        let left = a.clone().combine(b.clone()).combine(c.clone());
        let right = a.combine(b.combine(c));
        prop_assert_eq!(left, right);
    }

    /// Property: the default summary is an identity for `combine`.
    #[test]
    fn prop_combine_identity(a in summary_strategy()) {
        prop_assert_eq!(a.clone().combine(CleanupSummary::default()), a);
    }
}
