//! CLI support.
//!
//! Argument parsing helpers and report rendering for the `cloudreap`
//! binary.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `serve` | Run as MCP server over stdio |
//! | `cleanup` | Delete expired instances, services, or both |
//! | `expiring` | Forecast upcoming expirations |
//! | `labels` | Print the labels a new resource would receive |
//! | `config` | Show the effective configuration |
//!
//! # Example Usage
//!
//! ```bash
//! # Preview what would be removed
//! cloudreap cleanup --kind all --dry-run
//!
//! # Instances expiring within three days, as JSON
//! cloudreap expiring --days 3 --format json
//!
//! # Labels for a one-day scratch VM
//! cloudreap labels --label team=ml --ttl 24h
//! ```

mod labels;
mod report;

pub use labels::parse_label_arg;
pub use report::{
    render_cleanup_report, render_combined_report, render_config, render_forecast,
    render_labels,
};

use clap::ValueEnum;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}
