//! # Cloudreap
//!
//! Resource lifecycle and TTL cleanup for agent-provisioned cloud resources.
//!
//! Every resource an agent creates carries a small set of ownership and
//! expiration labels. Cloudreap builds those labels, scans resource
//! populations for entries whose time-to-live has elapsed, deletes them with
//! per-resource failure isolation, and forecasts upcoming expirations.
//!
//! ## Features
//!
//! - Immutable `managed-by` / `created-at` labels with GCP-safe sanitization
//! - Deterministic, ordered expiration decisions (unmanaged resources are never touched)
//! - Dry-run cleanup and per-kind or combined reports
//! - Expiration forecasting with a permanent-resource bucket
//! - MCP server over stdio for agent interoperability
//!
//! ## Example
//!
//! ```rust,ignore
//! use cloudreap::{CleanupService, CloudreapConfig};
//!
//! let service = CleanupService::from_config(CloudreapConfig::load(None)?);
//! let report = service.cleanup_expired_instances(None, true).await;
//! println!("{}", report.summary.message());
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cli;
pub mod config;
pub mod lifecycle;
pub mod mcp;
pub mod models;
pub mod observability;
pub mod providers;
pub mod services;

// Re-exports for convenience
pub use config::CloudreapConfig;
pub use lifecycle::{
    CleanupOrchestrator, Clock, Evaluation, ExpirationEvaluator, ExpirationForecaster,
    FixedClock, LabelPolicy, SystemClock, Ttl,
};
pub use models::{
    CleanupReport, CleanupStatus, CleanupSummary, CombinedCleanupReport, ExpirationForecast,
    ExpirationForecastEntry, ResourceDescriptor, ResourceKind, ResourceLabels, Scope,
};
pub use providers::{InMemoryProvider, ResourcePage, ResourceProvider};
pub use services::CleanupService;

/// Error type for cloudreap operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed tool arguments, bad CLI label syntax |
/// | `OperationFailed` | Config I/O, subscriber or exporter initialization |
/// | `NotImplemented` | A provider cannot enumerate its resource kind |
/// | `InvalidTtlFormat` | A `ttl` label is neither `never` nor `<n>d` / `<n>h` |
/// | `InvalidTimestampFormat` | A `created-at` label is not `YYYYMMDD-HHMMSS` |
/// | `NotManaged` | A resource lacks `managed-by=mcp` |
/// | `MissingLabel` | A managed resource lacks `created-at` or `ttl` |
/// | `ProviderFailure` | The cloud backend rejected a list or delete call |
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Config files cannot be read or parsed
    /// - The tracing subscriber or metrics exporter fails to install
    /// - Stdio transport reads or writes fail
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The requested capability is not available for this resource kind.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// A TTL string did not match `never` or `<integer><d|h>`.
    #[error("invalid TTL format: {value}")]
    InvalidTtlFormat {
        /// The rejected value.
        value: String,
    },

    /// A creation timestamp did not match `YYYYMMDD-HHMMSS`.
    #[error("invalid created-at format: {value}")]
    InvalidTimestampFormat {
        /// The rejected value.
        value: String,
    },

    /// The resource is not managed by this system.
    #[error("not MCP-managed")]
    NotManaged,

    /// A required lifecycle label is absent.
    #[error("missing {key} label")]
    MissingLabel {
        /// The absent label key.
        key: String,
    },

    /// The cloud backend failed a list or delete call.
    #[error("provider '{operation}' failed: {cause}")]
    ProviderFailure {
        /// The provider operation (`list`, `delete`).
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for cloudreap operations.
pub type Result<T> = std::result::Result<T, Error>;
