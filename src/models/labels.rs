//! Lifecycle label schema and sanitization.
//!
//! Every managed resource carries four reserved labels:
//!
//! | Key | Value | Mutable after creation |
//! |-----|-------|------------------------|
//! | `managed-by` | always `mcp` | no |
//! | `owner` | sanitized owner identity | yes |
//! | `created-at` | `YYYYMMDD-HHMMSS` (UTC) | no |
//! | `ttl` | `never` or `<n>d` / `<n>h` | yes |
//!
//! Keys and values are lowercased, restricted to ASCII letters, digits, and
//! hyphens, and truncated to 63 characters.

use super::LabelMap;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Label key marking a resource as lifecycle-managed.
pub const MANAGED_BY_KEY: &str = "managed-by";

/// Label key holding the owner identity.
pub const OWNER_KEY: &str = "owner";

/// Label key holding the creation timestamp.
pub const CREATED_AT_KEY: &str = "created-at";

/// Label key holding the time-to-live.
pub const TTL_KEY: &str = "ttl";

/// The only `managed-by` value eligible for lifecycle management.
pub const MANAGED_BY_VALUE: &str = "mcp";

/// Maximum length of a label key or value.
pub const MAX_LABEL_LENGTH: usize = 63;

/// Maximum number of labels on a single resource.
pub const MAX_LABELS: usize = 64;

/// Number of reserved lifecycle labels.
const RESERVED_LABEL_COUNT: usize = 4;

/// Sanitizes a label key or value into the GCP label alphabet.
///
/// Lowercases, maps every character outside `[a-z0-9-]` (notably `_`, `.`,
/// `@`) to `-`, and truncates to [`MAX_LABEL_LENGTH`] characters.
///
/// # Examples
///
/// ```rust
/// use cloudreap::models::sanitize_label;
///
/// assert_eq!(sanitize_label("Team.Name@X"), "team-name-x");
/// assert_eq!(sanitize_label("Prod_1"), "prod-1");
/// ```
#[must_use]
pub fn sanitize_label(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_lowercase)
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .take(MAX_LABEL_LENGTH)
        .collect()
}

/// Returns true if the key may never be overwritten after creation.
#[must_use]
pub fn is_immutable_key(key: &str) -> bool {
    key == MANAGED_BY_KEY || key == CREATED_AT_KEY
}

/// A validated lifecycle label set.
///
/// Constructed by the label policy; the immutable keys are private and can
/// only be set at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLabels {
    created_at: DateTime<Utc>,
    owner: String,
    ttl: String,
    extra: BTreeMap<String, String>,
}

impl ResourceLabels {
    /// Creates a label set stamped with the given creation instant.
    ///
    /// The owner is sanitized. The TTL is stored as given; invalid values are
    /// reported later by the evaluator instead of rejected here.
    #[must_use]
    pub fn new(owner: &str, created_at: DateTime<Utc>, ttl: impl Into<String>) -> Self {
        Self {
            created_at,
            owner: sanitize_label(owner),
            ttl: ttl.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Returns the creation instant.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the owner label.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the TTL label.
    #[must_use]
    pub fn ttl(&self) -> &str {
        &self.ttl
    }

    /// Returns the non-reserved labels.
    #[must_use]
    pub const fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }

    /// Replaces the TTL without validation.
    #[must_use]
    pub fn with_ttl(mut self, ttl: impl Into<String>) -> Self {
        self.ttl = ttl.into();
        self
    }

    /// Applies one user-supplied label.
    ///
    /// Both key and value are sanitized. `managed-by` and `created-at` are
    /// ignored, `owner` and `ttl` replace the defaults, and anything else is
    /// added unless the resource already holds [`MAX_LABELS`] labels.
    #[must_use]
    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        let key = sanitize_label(key);
        let value = sanitize_label(value);

        if key.is_empty() {
            debug!("Skipping label with empty key");
            return self;
        }

        match key.as_str() {
            k if is_immutable_key(k) => {
                debug!(key = %k, "Ignoring override of immutable label");
            },
            OWNER_KEY => self.owner = value,
            TTL_KEY => self.ttl = value,
            _ => {
                if !self.extra.contains_key(&key) && self.len() >= MAX_LABELS {
                    warn!(key = %key, max = MAX_LABELS, "Label limit reached, dropping label");
                    return self;
                }
                self.extra.insert(key, value);
            },
        }
        self
    }

    /// Total number of labels, reserved keys included.
    #[must_use]
    pub fn len(&self) -> usize {
        RESERVED_LABEL_COUNT + self.extra.len()
    }

    /// Always false: the reserved labels are always present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Flattens into the raw key/value form attached to a resource.
    #[must_use]
    pub fn to_map(&self) -> LabelMap {
        let mut map = self.extra.clone();
        map.insert(MANAGED_BY_KEY.to_string(), MANAGED_BY_VALUE.to_string());
        map.insert(OWNER_KEY.to_string(), self.owner.clone());
        map.insert(
            CREATED_AT_KEY.to_string(),
            crate::lifecycle::format_created_at(self.created_at),
        );
        map.insert(TTL_KEY.to_string(), self.ttl.clone());
        map
    }
}
