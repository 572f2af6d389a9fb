//! Binary entry point for cloudreap.
//!
//! This binary provides the CLI and the MCP stdio server.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand, ValueEnum};
use cloudreap::cli::{
    OutputFormat, parse_label_arg, render_cleanup_report, render_combined_report, render_config,
    render_forecast, render_labels,
};
use cloudreap::config::CloudreapConfig;
use cloudreap::lifecycle::{DEFAULT_FORECAST_DAYS, LabelPolicy};
use cloudreap::mcp::{McpServer, RateLimitConfig};
use cloudreap::models::LabelMap;
use cloudreap::observability::{self, InitOptions};
use cloudreap::{CleanupService, CleanupStatus};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Cloudreap - TTL-based cleanup for agent-provisioned cloud resources.
#[derive(Parser)]
#[command(name = "cloudreap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Resource kinds selectable from the command line.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
enum KindArg {
    /// Compute Engine instances.
    Instances,
    /// Cloud Run services.
    Services,
    /// Every supported kind.
    #[default]
    All,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server on stdio.
    Serve,

    /// Delete expired resources.
    Cleanup {
        /// Resource kind to clean up.
        #[arg(short, long, value_enum, default_value_t = KindArg::All)]
        kind: KindArg,

        /// Zone for compute instances.
        #[arg(long)]
        zone: Option<String>,

        /// Region for Cloud Run services.
        #[arg(long)]
        region: Option<String>,

        /// Report what would be deleted without deleting.
        #[arg(long)]
        dry_run: bool,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List instances expiring soon.
    Expiring {
        /// Zone to scan.
        #[arg(long)]
        zone: Option<String>,

        /// Forecast horizon in days.
        #[arg(short, long, default_value_t = DEFAULT_FORECAST_DAYS)]
        days: u32,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the labels a new resource would receive.
    Labels {
        /// Custom label as KEY=VALUE (repeatable).
        #[arg(short, long = "label", value_parser = parse_label_arg)]
        labels: Vec<(String, String)>,

        /// TTL override such as 24h, 7d or never.
        #[arg(long)]
        ttl: Option<String>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Manage configuration.
    Config {
        /// Show current configuration.
        #[arg(long)]
        show: bool,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Main entry point.
#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match CloudreapConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let expose_metrics = matches!(cli.command, Commands::Serve);
    let _observability = match observability::init_from_config(
        &config.observability,
        InitOptions {
            verbose: cli.verbose,
            metrics_expose: expose_metrics,
        },
    ) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize observability: {e}");
            return ExitCode::FAILURE;
        },
    };

    match run_command(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
async fn run_command(
    command: Commands,
    config: CloudreapConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Serve => cmd_serve(config).await,
        Commands::Cleanup {
            kind,
            zone,
            region,
            dry_run,
            format,
        } => cmd_cleanup(config, kind, zone, region, dry_run, format).await,
        Commands::Expiring { zone, days, format } => cmd_expiring(config, zone, days, format).await,
        Commands::Labels {
            labels,
            ttl,
            format,
        } => cmd_labels(config, labels, ttl, format),
        Commands::Config { show, format } => cmd_config(&config, show, format),
    }
}

/// Serve command.
async fn cmd_serve(config: CloudreapConfig) -> Result<(), Box<dyn std::error::Error>> {
    let service = Arc::new(CleanupService::from_config(config));
    let server = McpServer::new(service).with_rate_limit(RateLimitConfig::from_env());
    server.serve_stdio().await?;
    Ok(())
}

/// Cleanup command.
async fn cmd_cleanup(
    config: CloudreapConfig,
    kind: KindArg,
    zone: Option<String>,
    region: Option<String>,
    dry_run: bool,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = CleanupService::from_config(config);

    let status = match kind {
        KindArg::Instances => {
            let report = service
                .cleanup_expired_instances(zone.as_deref(), dry_run)
                .await;
            print!("{}", render_cleanup_report(&report, format)?);
            report.status
        },
        KindArg::Services => {
            let report = service
                .cleanup_expired_services(region.as_deref(), dry_run)
                .await;
            print!("{}", render_cleanup_report(&report, format)?);
            report.status
        },
        KindArg::All => {
            let report = service
                .cleanup_all_expired_resources(zone.as_deref(), region.as_deref(), dry_run)
                .await;
            print!("{}", render_combined_report(&report, format)?);
            report.status
        },
    };

    if status == CleanupStatus::Error {
        return Err("cleanup failed".into());
    }
    Ok(())
}

/// Expiring command.
async fn cmd_expiring(
    config: CloudreapConfig,
    zone: Option<String>,
    days: u32,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = CleanupService::from_config(config);
    let forecast = service
        .list_expiring_resources(zone.as_deref(), Some(days))
        .await;
    print!("{}", render_forecast(&forecast, format)?);

    if forecast.status == CleanupStatus::Error {
        return Err("expiration forecast failed".into());
    }
    Ok(())
}

/// Labels command.
fn cmd_labels(
    config: CloudreapConfig,
    labels: Vec<(String, String)>,
    ttl: Option<String>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = CleanupService::from_config(config);
    let user_labels: LabelMap = labels.into_iter().collect();
    let generated = service.generate_labels(
        (!user_labels.is_empty()).then_some(&user_labels),
        ttl.as_deref(),
    );

    if !LabelPolicy::validate_ttl(generated.ttl()) {
        eprintln!(
            "Warning: ttl '{}' is not valid; resources carrying it are never cleaned up",
            generated.ttl()
        );
    }
    print!("{}", render_labels(&generated, format)?);
    Ok(())
}

/// Config command.
fn cmd_config(
    config: &CloudreapConfig,
    show: bool,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        print!("{}", render_config(config, format)?);
    } else {
        println!("Use --show to display configuration");
    }
    Ok(())
}
