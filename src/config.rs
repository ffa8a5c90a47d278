//! Configuration management for Formentor
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files.

use crate::error::{FormentorError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_true() -> bool {
    true
}

/// Default We Connect endpoint for the MyCupra service
pub const DEFAULT_API_BASE: &str = "https://ola.prod.code.seat.cloud.vwgroup.com";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    /// Cloud account credentials and endpoint selection
    #[serde(default)]
    pub account: AccountConfig,

    /// Polling cadence and timeouts
    #[serde(default)]
    pub polling: PollingConfig,

    /// Web server binding configuration
    #[serde(default)]
    pub web: WebConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// We Connect account parameters
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AccountConfig {
    /// Account username (email address)
    pub username: String,

    /// Account password
    pub password: String,

    /// Brand service profile; only "MyCupra" is accepted
    pub service: String,

    /// Base URL of the vendor API
    pub api_base: String,
}

/// Polling cadence and timeouts
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PollingConfig {
    /// Seconds between scheduled account refreshes
    pub interval_seconds: u64,

    /// Upper bound for one full account refresh, in seconds
    pub refresh_timeout_seconds: u64,

    /// Per-request timeout for individual API calls, in seconds
    pub request_timeout_seconds: u64,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WebConfig {
    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoggingConfig {
    /// Log level (DEBUG, INFO, WARNING, ERROR, CRITICAL)
    pub level: String,

    /// Path to log file
    pub file: String,

    /// Log format (structured or simple)
    pub format: String,

    /// Max log file size in MB
    pub max_file_size_mb: u32,

    /// Number of backup files to keep
    pub backup_count: u32,

    /// Whether to log to console
    #[serde(default = "default_true")]
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,

    /// Optional per-sink level override for the console
    #[serde(default)]
    pub console_level: Option<String>,

    /// Optional per-sink level override for the log file
    #[serde(default)]
    pub file_level: Option<String>,

    /// Optional per-sink level override for the web log stream
    #[serde(default)]
    pub web_level: Option<String>,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            service: "MyCupra".to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 300,
            refresh_timeout_seconds: 120,
            request_timeout_seconds: 10,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8188,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/formentor.log".to_string(),
            format: "structured".to_string(),
            max_file_size_mb: 10,
            backup_count: 5,
            console_output: true,
            json_format: false,
            console_level: None,
            file_level: None,
            web_level: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account: AccountConfig::default(),
            polling: PollingConfig::default(),
            web: WebConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        let default_paths = [
            "formentor_config.yaml",
            "/data/formentor_config.yaml",
            "/etc/formentor/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.account.username.is_empty() {
            return Err(FormentorError::validation(
                "account.username",
                "Username cannot be empty",
            ));
        }

        if self.account.password.is_empty() {
            return Err(FormentorError::validation(
                "account.password",
                "Password cannot be empty",
            ));
        }

        if self.account.service != "MyCupra" {
            return Err(FormentorError::validation(
                "account.service",
                "Service must be MyCupra",
            ));
        }

        if !self.account.api_base.starts_with("http") {
            return Err(FormentorError::validation(
                "account.api_base",
                "API base must be an http(s) URL",
            ));
        }

        if self.polling.interval_seconds == 0 {
            return Err(FormentorError::validation(
                "polling.interval_seconds",
                "Must be greater than 0",
            ));
        }

        if self.polling.refresh_timeout_seconds == 0 {
            return Err(FormentorError::validation(
                "polling.refresh_timeout_seconds",
                "Must be greater than 0",
            ));
        }

        if self.polling.request_timeout_seconds == 0 {
            return Err(FormentorError::validation(
                "polling.request_timeout_seconds",
                "Must be greater than 0",
            ));
        }

        if self.web.port == 0 {
            return Err(FormentorError::validation(
                "web.port",
                "Port must be greater than 0",
            ));
        }

        Ok(())
    }
}
