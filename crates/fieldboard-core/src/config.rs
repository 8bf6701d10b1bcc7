use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// A single rejected or suspect config field.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

/// Outcome of [`Config::validate`]: hard errors plus advisory warnings.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Warnings alone do not make a config invalid.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// All errors joined into one line for an error message.
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Task service (server) settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Board client settings
    #[serde(default)]
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP API binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

fn default_bind_address() -> String {
    "127.0.0.1:3001".to_string()
}

fn default_database_path() -> String {
    "tasks.db".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            database_path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the task service API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Poll interval for board refresh, in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Additional attempts for failed status transitions
    #[serde(default = "default_status_retries")]
    pub status_retries: u32,

    /// Delay between status-transition retries, in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_api_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_status_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            poll_interval_secs: default_poll_interval_secs(),
            status_retries: default_status_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl ClientConfig {
    /// Poll interval for the sync engine's run loop.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

impl Config {
    /// Load the config file, writing defaults on first run.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Load and validate in one step.
    ///
    /// Hard validation errors abort; warnings are logged and returned.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!("Invalid configuration: {}", validation.error_summary());
        }
        for warning in &validation.warnings {
            tracing::warn!("Config warning: {warning}");
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        // Validate API URL
        self.validate_url(&self.client.api_url, "client.api_url", &mut result);

        // Validate bind address
        if self.server.bind_address.parse::<std::net::SocketAddr>().is_err() {
            result.add_error(
                "server.bind_address",
                format!("Not a valid socket address: {}", self.server.bind_address),
            );
        }

        // Validate database path
        if self.server.database_path.trim().is_empty() {
            result.add_error("server.database_path", "Database path cannot be empty");
        }

        // Validate poll interval
        if self.client.poll_interval_secs == 0 {
            result.add_warning(
                "client.poll_interval_secs",
                "Board polling disabled (0 seconds)",
            );
        } else if self.client.poll_interval_secs > 300 {
            result.add_warning(
                "client.poll_interval_secs",
                "Poll interval is more than 5 minutes; the board will feel stale",
            );
        }

        // Validate retry settings
        if self.client.status_retries > 10 {
            result.add_warning(
                "client.status_retries",
                "More than 10 retries will hold drag errors open for a long time",
            );
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        let url = match Url::parse(url_str) {
            Ok(url) => url,
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {e}"));
                return;
            }
        };

        if url.scheme() != "http" && url.scheme() != "https" {
            result.add_error(
                field_name,
                format!("URL must use http or https scheme, got: {}", url.scheme()),
            );
        }
        if url.host().is_none() {
            result.add_error(field_name, "URL must have a host");
        }
        if url.port() == Some(0) {
            result.add_error(field_name, "Port cannot be 0");
        }
    }

    /// Write the config file, creating its directory as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// `<platform config dir>/fieldboard/config.toml`
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to resolve the platform config directory")?
            .join("fieldboard");
        Ok(config_dir.join("config.toml"))
    }
}
