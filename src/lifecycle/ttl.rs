//! TTL and creation-timestamp parsing.
//!
//! Pure functions, no clock access.
//!
//! | Input | Result |
//! |-------|--------|
//! | `never`, `NEVER` | [`Ttl::Never`] |
//! | `7d`, `12H` | [`Ttl::Finite`] of 7 days / 12 hours |
//! | `7`, `1w`, `-1d`, ` 7d` | [`Error::InvalidTtlFormat`] |

use crate::{Error, Result};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// `strftime` pattern of the `created-at` label.
pub const CREATED_AT_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Literal TTL value marking a permanent resource.
pub const NEVER: &str = "never";

/// `<digits><d|h>`, any case.
static TTL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+)([dh])$").unwrap_or_else(|_| unreachable!()));

/// `YYYYMMDD-HHMMSS`, checked before chrono parsing, which tolerates
/// unpadded fields.
static CREATED_AT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{8}-\d{6}$").unwrap_or_else(|_| unreachable!()));

/// A parsed time-to-live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// The resource never expires.
    Never,
    /// The resource expires this long after creation.
    Finite(TimeDelta),
}

impl Ttl {
    /// Returns the expiration instant for a resource created at `created_at`.
    ///
    /// `None` for permanent resources, or if the sum leaves chrono's range.
    #[must_use]
    pub fn expiration(&self, created_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Never => None,
            Self::Finite(duration) => created_at.checked_add_signed(*duration),
        }
    }

    /// Returns true for [`Ttl::Never`].
    #[must_use]
    pub const fn is_never(&self) -> bool {
        matches!(self, Self::Never)
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => write!(f, "{NEVER}"),
            Self::Finite(d) if d.num_hours() % 24 == 0 => write!(f, "{}d", d.num_days()),
            Self::Finite(d) => write!(f, "{}h", d.num_hours()),
        }
    }
}

/// Parses a TTL label value.
///
/// # Errors
///
/// Returns [`Error::InvalidTtlFormat`] when the value is neither `never` nor
/// `<integer><d|h>`, or when the amount overflows.
pub fn parse_ttl(value: &str) -> Result<Ttl> {
    if value.eq_ignore_ascii_case(NEVER) {
        return Ok(Ttl::Never);
    }

    let invalid = || Error::InvalidTtlFormat {
        value: value.to_string(),
    };

    let captures = TTL_PATTERN.captures(value).ok_or_else(invalid)?;
    let amount: i64 = captures[1].parse().map_err(|_| invalid())?;
    let duration = if captures[2].eq_ignore_ascii_case("d") {
        TimeDelta::try_days(amount)
    } else {
        TimeDelta::try_hours(amount)
    };

    duration.map(Ttl::Finite).ok_or_else(invalid)
}

/// Returns true if `value` parses as a TTL.
#[must_use]
pub fn is_valid_ttl(value: &str) -> bool {
    parse_ttl(value).is_ok()
}

/// Parses a `created-at` label value as a UTC instant.
///
/// # Errors
///
/// Returns [`Error::InvalidTimestampFormat`] unless the value is exactly
/// `YYYYMMDD-HHMMSS` and names a real date and time.
pub fn parse_created_at(value: &str) -> Result<DateTime<Utc>> {
    let invalid = || Error::InvalidTimestampFormat {
        value: value.to_string(),
    };

    if !CREATED_AT_PATTERN.is_match(value) {
        return Err(invalid());
    }

    NaiveDateTime::parse_from_str(value, CREATED_AT_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| invalid())
}

/// Formats an instant as a `created-at` label value.
#[must_use]
pub fn format_created_at(instant: DateTime<Utc>) -> String {
    instant.format(CREATED_AT_FORMAT).to_string()
}
