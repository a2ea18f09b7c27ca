//! Configuration file management for certmetrics.
//!
//! Settings come from three places, merged with clear precedence:
//!
//! 1. Default values (lowest priority)
//! 2. Configuration file (certmetrics.toml or specified with --config)
//! 3. Command-line arguments (highest priority)
//!
//! # Example Configuration File
//!
//! ```toml
//! certificates = ["/etc/ssl/certs/server.pem"]
//! output = "prometheus"
//!
//! [prometheus]
//! enabled = true
//! address = "http://localhost:9091"
//! job = "certmetrics"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use strum_macros::{Display, EnumString};

/// Name of the configuration file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "certmetrics.toml";

/// How observed series are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    /// Prometheus text exposition
    Prometheus,
    Json,
    Table,
}

/// All fields are optional so partial configurations can be merged.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Certificate files (PEM bundles or DER) to observe
    pub certificates: Option<Vec<String>>,
    /// Output format: prometheus, json, table
    pub output: Option<String>,
    /// Pushgateway configuration
    pub prometheus: Option<PrometheusConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PrometheusConfig {
    /// Push the registry to a Pushgateway after observing
    pub enabled: Option<bool>,
    /// Pushgateway address (e.g., "http://localhost:9091")
    pub address: Option<String>,
    /// Job name used when pushing
    pub job: Option<String>,
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use certmetrics::config::Config;
    /// let config = Config::from_file("certmetrics.toml")?;
    /// # Ok::<(), certmetrics::config::ConfigError>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(config)
    }

    /// Default values: no certificates, prometheus output, push disabled
    /// towards `http://localhost:9091` with job `certmetrics`.
    pub fn default() -> Self {
        Config {
            certificates: None,
            output: Some(OutputFormat::Prometheus.to_string()),
            prometheus: Some(PrometheusConfig {
                enabled: Some(false),
                address: Some("http://localhost:9091".to_string()),
                job: Some("certmetrics".to_string()),
            }),
        }
    }

    /// Merges `other` into this configuration; values set in `other` win.
    pub fn merge_with(mut self, other: Config) -> Self {
        if other.certificates.is_some() {
            self.certificates = other.certificates;
        }
        if other.output.is_some() {
            self.output = other.output;
        }
        if let Some(other_prom) = other.prometheus {
            if let Some(ref mut self_prom) = self.prometheus {
                if other_prom.enabled.is_some() {
                    self_prom.enabled = other_prom.enabled;
                }
                if other_prom.address.is_some() {
                    self_prom.address = other_prom.address;
                }
                if other_prom.job.is_some() {
                    self_prom.job = other_prom.job;
                }
            } else {
                self.prometheus = Some(other_prom);
            }
        }
        self
    }

    /// Builds the CLI layer of the configuration. Only `Some` values override.
    pub fn from_cli_args(
        certificates: Option<Vec<String>>,
        output: Option<String>,
        prometheus: Option<bool>,
        prometheus_address: Option<String>,
        job: Option<String>,
    ) -> Self {
        Config {
            certificates,
            output,
            prometheus: Some(PrometheusConfig {
                enabled: prometheus,
                address: prometheus_address,
                job,
            }),
        }
    }

    /// Checks that the merged configuration can be run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.certificates {
            Some(certs) if !certs.is_empty() => {}
            _ => {
                return Err(ConfigError::Validation(
                    "at least one certificate file is required".to_string(),
                ))
            }
        }
        self.output_format()?;

        if self.push_enabled() {
            let address = self
                .prometheus
                .as_ref()
                .and_then(|p| p.address.as_deref())
                .unwrap_or("");
            if address.is_empty() {
                return Err(ConfigError::Validation(
                    "prometheus.address is required when pushing".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// The configured output format, `prometheus` when unset.
    pub fn output_format(&self) -> Result<OutputFormat, ConfigError> {
        match self.output.as_deref() {
            None => Ok(OutputFormat::Prometheus),
            Some(value) => OutputFormat::from_str(value).map_err(|_| {
                ConfigError::Validation(format!(
                    "unknown output '{}', expected prometheus, json or table",
                    value
                ))
            }),
        }
    }

    pub fn push_enabled(&self) -> bool {
        self.prometheus
            .as_ref()
            .and_then(|p| p.enabled)
            .unwrap_or(false)
    }

    /// An example configuration file with every option set.
    pub fn example_toml() -> String {
        let example = Config {
            certificates: Some(vec![
                "/etc/ssl/certs/server.pem".to_string(),
                "/etc/ssl/certs/ca-bundle.pem".to_string(),
            ]),
            output: Some(OutputFormat::Prometheus.to_string()),
            prometheus: Some(PrometheusConfig {
                enabled: Some(true),
                address: Some("http://localhost:9091".to_string()),
                job: Some("certmetrics".to_string()),
            }),
        };

        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| "# Error generating example".to_string())
    }
}

/// Errors that can occur during configuration loading and parsing.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error (file not found, permission denied, etc.)
    Io(String),
    /// TOML parsing error (invalid syntax, type mismatch, etc.)
    Parse(String),
    /// Validation error (missing required fields, invalid values, etc.)
    Validation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "IO Error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Parse Error: {}", msg),
            ConfigError::Validation(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
