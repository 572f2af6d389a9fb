//! Configuration management.
//!
//! Settings come from three layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file (`--config`, `CLOUDREAP_CONFIG_PATH`, or the platform
//!    config dir, e.g. `~/.config/cloudreap/config.toml`)
//! 3. Environment variables (a `.env` file is loaded by the binary first)
//!
//! | Variable | Setting |
//! |----------|---------|
//! | `GCP_PROJECT_ID` | `project_id` |
//! | `GCP_REGION` | `region` |
//! | `DEFAULT_ZONE` | `default_zone` |
//! | `CLOUDREAP_OWNER` | `owner` |
//! | `CLOUDREAP_DEFAULT_TTL` | `default_ttl` |
//! | `CLOUDREAP_GCLOUD_PATH` | `gcloud.binary` |
//! | `CLOUDREAP_GCLOUD_TIMEOUT_SECS` | `gcloud.timeout_secs` |
//! | `LOG_LEVEL` | `observability.logging.level` |
//! | `CLOUDREAP_LOG_FORMAT` | `observability.logging.format` |
//! | `CLOUDREAP_LOG_FILE` | `observability.logging.file` |
//! | `CLOUDREAP_METRICS_ENABLED` | `observability.metrics.enabled` |
//! | `CLOUDREAP_METRICS_PORT` | `observability.metrics.port` |

use crate::lifecycle::{DEFAULT_OWNER, DEFAULT_TTL, parse_ttl};
use crate::models::sanitize_label;
use crate::providers::GcloudSettings;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "CLOUDREAP_CONFIG_PATH";

/// Default region for regional resources.
pub const DEFAULT_REGION: &str = "us-central1";

/// Default zone for zonal resources.
pub const DEFAULT_ZONE: &str = "us-central1-a";

/// Main configuration for cloudreap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudreapConfig {
    /// GCP project, passed to `gcloud --project` when set.
    pub project_id: Option<String>,
    /// Region used when a call does not name one.
    pub region: String,
    /// Zone used when a call does not name one.
    pub default_zone: String,
    /// Owner stamped on new resources (sanitized).
    pub owner: String,
    /// TTL stamped on new resources when the caller supplies none.
    pub default_ttl: String,
    /// How to invoke `gcloud`.
    pub gcloud: GcloudSettings,
    /// Logging and metrics settings.
    pub observability: ObservabilitySettings,
}

/// Observability section of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ObservabilitySettings {
    /// Logging settings.
    pub logging: Option<LoggingSettings>,
    /// Metrics settings.
    pub metrics: Option<MetricsSettings>,
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoggingSettings {
    /// `json` or `pretty`.
    pub format: Option<String>,
    /// Filter directive such as `info` or `cloudreap=debug`.
    pub level: Option<String>,
    /// Optional log file; logs go to stderr otherwise.
    pub file: Option<String>,
}

/// Metrics settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MetricsSettings {
    /// Whether the Prometheus recorder is installed.
    pub enabled: Option<bool>,
    /// Port of the Prometheus HTTP listener.
    pub port: Option<u16>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// GCP project.
    pub project_id: Option<String>,
    /// Default region.
    pub region: Option<String>,
    /// Default zone.
    pub default_zone: Option<String>,
    /// Owner label.
    pub owner: Option<String>,
    /// Default TTL.
    pub default_ttl: Option<String>,
    /// gcloud section.
    pub gcloud: Option<ConfigFileGcloud>,
    /// Observability section.
    pub observability: Option<ObservabilitySettings>,
}

/// gcloud section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileGcloud {
    /// Binary path.
    pub binary: Option<String>,
    /// Per-command timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for CloudreapConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            region: DEFAULT_REGION.to_string(),
            default_zone: DEFAULT_ZONE.to_string(),
            owner: DEFAULT_OWNER.to_string(),
            default_ttl: DEFAULT_TTL.to_string(),
            gcloud: GcloudSettings::default(),
            observability: ObservabilitySettings::default(),
        }
    }
}

impl CloudreapConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the effective configuration.
    ///
    /// Reads `path` if given, else `CLOUDREAP_CONFIG_PATH`, else the default
    /// location; then applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be loaded or the
    /// result fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let base = match path.map(Path::to_path_buf).or(env_path) {
            Some(explicit) => Self::load_from_file(&explicit)?,
            None => Self::load_default(),
        };

        base.with_env_overrides().validated()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config file.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the platform config dir, then `~/.config/cloudreap/`. Returns
    /// defaults if neither holds a readable file.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            base_dirs.config_dir().join("cloudreap").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("cloudreap")
                .join("config.toml"),
        ];

        for candidate in candidates {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %candidate.display(), error = %e, "Ignoring unreadable config file");
                },
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `CloudreapConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(project_id) = file.project_id {
            config.project_id = Some(project_id);
        }
        if let Some(region) = file.region {
            config.region = region;
        }
        if let Some(zone) = file.default_zone {
            config.default_zone = zone;
        }
        if let Some(owner) = file.owner {
            config.owner = owner;
        }
        if let Some(ttl) = file.default_ttl {
            config.default_ttl = ttl;
        }
        if let Some(gcloud) = file.gcloud {
            if let Some(binary) = gcloud.binary {
                config.gcloud.binary = PathBuf::from(binary);
            }
            if let Some(secs) = gcloud.timeout_secs {
                config.gcloud.timeout = Duration::from_secs(secs);
            }
        }
        if let Some(observability) = file.observability {
            config.observability = observability;
        }

        config
    }

    /// Applies overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    ///
    /// Empty values are ignored.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(project) = get("GCP_PROJECT_ID") {
            self.project_id = Some(project);
        }
        if let Some(region) = get("GCP_REGION") {
            self.region = region;
        }
        if let Some(zone) = get("DEFAULT_ZONE") {
            self.default_zone = zone;
        }
        if let Some(owner) = get("CLOUDREAP_OWNER") {
            self.owner = owner;
        }
        if let Some(ttl) = get("CLOUDREAP_DEFAULT_TTL") {
            self.default_ttl = ttl;
        }
        if let Some(binary) = get("CLOUDREAP_GCLOUD_PATH") {
            self.gcloud.binary = PathBuf::from(binary);
        }
        if let Some(secs) = get("CLOUDREAP_GCLOUD_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.gcloud.timeout = Duration::from_secs(secs);
        }

        let logging = self.observability.logging.get_or_insert_with(LoggingSettings::default);
        if let Some(level) = get("LOG_LEVEL") {
            logging.level = Some(level);
        }
        if let Some(format) = get("CLOUDREAP_LOG_FORMAT") {
            logging.format = Some(format);
        }
        if let Some(file) = get("CLOUDREAP_LOG_FILE") {
            logging.file = Some(file);
        }

        let metrics = self.observability.metrics.get_or_insert_with(MetricsSettings::default);
        if let Some(enabled) = get("CLOUDREAP_METRICS_ENABLED") {
            let enabled = enabled.to_lowercase();
            metrics.enabled = Some(enabled == "true" || enabled == "1" || enabled == "yes");
        }
        if let Some(port) = get("CLOUDREAP_METRICS_PORT").and_then(|p| p.parse().ok()) {
            metrics.port = Some(port);
        }

        self
    }

    /// Validates and normalizes the configuration.
    ///
    /// The owner is sanitized into a legal label value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the default TTL does not parse, or
    /// the region or zone is empty.
    pub fn validated(mut self) -> Result<Self> {
        parse_ttl(&self.default_ttl)
            .map_err(|e| Error::InvalidInput(format!("default_ttl: {e}")))?;

        if self.region.trim().is_empty() {
            return Err(Error::InvalidInput("region must not be empty".to_string()));
        }
        if self.default_zone.trim().is_empty() {
            return Err(Error::InvalidInput(
                "default_zone must not be empty".to_string(),
            ));
        }

        let owner = sanitize_label(&self.owner);
        self.owner = if owner.is_empty() {
            DEFAULT_OWNER.to_string()
        } else {
            owner
        };
        if self.gcloud.project_id.is_none() {
            self.gcloud.project_id.clone_from(&self.project_id);
        }

        Ok(self)
    }

    /// Sets the owner.
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Sets the default TTL.
    #[must_use]
    pub fn with_default_ttl(mut self, ttl: impl Into<String>) -> Self {
        self.default_ttl = ttl.into();
        self
    }
}
