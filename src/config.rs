//! Configuration management for the RDA client
//!
//! Every setting has a default, so no configuration file is required. A file
//! is looked up in the working directory and then the user config directory;
//! a few environment variables override it afterwards.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::app::{ClientConfig, RetryPolicy};
use crate::constants::{auth, env as env_constants, files, http, limits, rda};
use crate::errors::{AppError, ConfigError, Result};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// API endpoints
    pub api: ApiConfigToml,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Credential file location
    pub credentials: CredentialsConfigToml,
    /// Bulk download settings
    pub download: DownloadConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// API endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfigToml {
    /// Base URL all API paths are relative to
    pub base_url: String,
    /// Login form used to establish a download session
    pub login_url: String,
}

impl Default for ApiConfigToml {
    fn default() -> Self {
        Self {
            base_url: rda::BASE_URL.to_string(),
            login_url: rda::LOGIN_URL.to_string(),
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Deadline for each API call, e.g. "10m". File downloads have none.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout, e.g. "30s"
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
        }
    }
}

/// Credential file configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfigToml {
    /// Plaintext `username,password` file
    pub file: PathBuf,
}

impl Default for CredentialsConfigToml {
    fn default() -> Self {
        Self {
            file: PathBuf::from(auth::CREDENTIAL_FILE),
        }
    }
}

/// Bulk download configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfigToml {
    /// Directory that `rda_request_<index>` directories are created in
    pub root: PathBuf,
    /// Attempts per file before the download is abandoned
    pub max_attempts: u32,
    /// Delay before the first retry; doubles after each failure
    #[serde(with = "humantime_serde")]
    pub retry_base_delay: Duration,
    /// Use an animated progress bar when stdout is a terminal
    pub progress_bars: bool,
}

impl Default for DownloadConfigToml {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            max_attempts: limits::DEFAULT_DOWNLOAD_ATTEMPTS,
            retry_base_delay: limits::RETRY_BASE_DELAY,
            progress_bars: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (explicit, else the first one found)
    /// 3. Environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if an explicit file does not exist,
    /// and `ConfigError::InvalidFormat` or `ConfigError::InvalidValue` for a
    /// file that cannot be used.
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                    return Err(ConfigError::NotFound { path }.into());
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => Self::default(),
        };

        config.apply_env_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(files::LOCAL_CONFIG_FILE)];
        if let Some(path) = Self::default_config_path() {
            search_paths.push(path);
        }

        let found = search_paths.into_iter().find(|path| path.is_file());
        match &found {
            Some(path) => debug!("Found config file: {}", path.display()),
            None => debug!("No config file found in standard locations"),
        }
        found
    }

    /// Get the default config file path for the current user
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(files::CONFIG_DIR_NAME).join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> Result<Self> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;

        let config = Self::from_toml(&content, path)?;
        debug!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    fn from_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| {
            ConfigError::InvalidFormat {
                path: path.to_path_buf(),
                source,
            }
            .into()
        })
    }

    /// Apply `RDAMS_*` overrides; `lookup` returns a variable's value if set
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(value) = lookup(env_constants::BASE_URL) {
            debug!("Base URL overridden from environment");
            self.api.base_url = value;
        }
        if let Some(value) = lookup(env_constants::LOGIN_URL) {
            debug!("Login URL overridden from environment");
            self.api.login_url = value;
        }
        if let Some(value) = lookup(env_constants::CREDENTIAL_FILE) {
            self.credentials.file = PathBuf::from(value);
        }
        if let Some(value) = lookup(env_constants::DOWNLOAD_ROOT) {
            self.download.root = PathBuf::from(value);
        }
    }

    /// Check values that would otherwise fail later at runtime
    pub fn validate(&self) -> Result<()> {
        parse_url("api.base_url", &self.api.base_url)?;
        parse_url("api.login_url", &self.api.login_url)?;

        if self.client.rate_limit_rps == 0 {
            return Err(invalid_value(
                "client.rate_limit_rps",
                "0",
                "Rate limit must be non-zero",
            ));
        }
        if self.download.max_attempts == 0 {
            return Err(invalid_value(
                "download.max_attempts",
                "0",
                "At least one attempt is required",
            ));
        }
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url> {
        parse_url("api.base_url", &self.api.base_url)
    }

    pub fn login_url(&self) -> Result<Url> {
        parse_url("api.login_url", &self.api.login_url)
    }

    /// Convert to runtime ClientConfig
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            request_timeout: self.client.request_timeout,
            connect_timeout: self.client.connect_timeout,
            rate_limit_rps: self.client.rate_limit_rps,
        }
    }

    /// Convert to the per-file retry policy
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.download.max_attempts,
            base_delay: self.download.retry_base_delay,
        }
    }

    /// Effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AppError::generic(format!("Failed to serialize configuration: {}", e)))
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| invalid_value(field, value, &e.to_string()))
}

fn invalid_value(field: &str, value: &str, reason: &str) -> AppError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
    .into()
}
