//! Error types for the RDA client
//!
//! This module defines the error types for every component of the application.
//! Each failure class maps to its own process exit code through
//! [`AppError::exit_code`].

use std::path::PathBuf;
use thiserror::Error;

use crate::constants::{exit, rda};

/// Command-line usage errors
#[derive(Error, Debug)]
pub enum UsageError {
    /// A required positional argument was not given
    #[error("Missing required argument.\nUsage: \n{usage}")]
    MissingArgument { usage: String },

    /// Dataset id does not normalize to a canonical `dsNNN.N`
    #[error("'{id}' is not valid.")]
    InvalidDatasetId { id: String },

    /// Request index is empty or would escape its path segment
    #[error("'{index}' is not a valid request index.")]
    InvalidRequestIndex { index: String },
}

/// Authentication-related errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Second consecutive 401 from the API
    #[error(
        "RDA username and password invalid, or you are not authorized to access this dataset.\nPlease verify your login information at {}.",
        rda::ACCOUNT_URL
    )]
    InvalidCredentials,

    /// Interactive input was rejected
    #[error("Invalid credentials input: {reason}")]
    InvalidInput { reason: String },

    /// Reading from the terminal failed
    #[error("Failed to read credentials from the terminal")]
    Prompt(#[source] std::io::Error),

    /// Credential file could not be read, written or removed
    #[error("Credential file error: {path}")]
    CredentialStorage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// HTTP request failed during the session login
    #[error("HTTP request failed during login")]
    Http(#[from] reqwest::Error),

    /// Session login was refused by the server
    #[error("RDA login failed with HTTP {status}. Please check your credentials and try again")]
    LoginFailed { status: u16 },
}

/// REST API call errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport-level failure (connection, DNS, timeout)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status other than a retried 401
    #[error("Server error: HTTP {status}\n{body}")]
    Status { status: u16, body: String },

    /// Server answered with a plain-text message where JSON was expected
    #[error("{0}")]
    ServerMessage(String),

    /// Endpoint URL could not be built
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },
}

/// Control file parsing errors
#[derive(Error, Debug)]
pub enum ControlFileError {
    /// Control file could not be read
    #[error("Failed to read control file: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A non-comment line without `=`
    #[error("Malformed control file line {line} in {path}: '{content}' (expected key=value)")]
    MalformedLine {
        path: PathBuf,
        line: usize,
        content: String,
    },
}

/// Download and file output errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// I/O error on a local file or directory
    #[error("File I/O error: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Server returned error status for a file
    #[error("Server error: HTTP {status} for {url}")]
    ServerError { status: u16, url: String },

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Manifest entry cannot be mapped to a local file
    #[error("Invalid manifest: {reason}")]
    InvalidManifest { reason: String },

    /// Every attempt for a file failed
    #[error("Maximum attempts ({attempts}) exceeded downloading {file}: {last_error}")]
    MaxRetriesExceeded {
        file: String,
        attempts: u32,
        last_error: String,
    },
}

impl DownloadError {
    /// Whether another attempt at the same file could succeed
    ///
    /// Malformed URLs and client errors other than 408 and 429 are permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            DownloadError::InvalidUrl { .. } | DownloadError::InvalidManifest { .. } => false,
            DownloadError::ServerError { status, .. } => {
                !(400..500).contains(status) || matches!(status, 408 | 429)
            }
            _ => true,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read
    #[error("Failed to read configuration file: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format in {path}: {source}")]
    InvalidFormat {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    ControlFile(#[from] ControlFileError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Local file error outside the download directory
    #[error("File I/O error: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Wrap an I/O error with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Usage(_) => "usage",
            AppError::Auth(_) => "authentication",
            AppError::Api(ApiError::ServerMessage(_)) => "server_message",
            AppError::Api(_) => "api",
            AppError::ControlFile(_) => "control_file",
            AppError::Download(_) => "download",
            AppError::Config(_) => "config",
            AppError::Io { .. } => "io",
            AppError::Generic { .. } => "generic",
        }
    }

    /// Process exit code for this failure class
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Usage(_) | AppError::Config(_) => exit::USAGE,
            AppError::Auth(AuthError::CredentialStorage { .. }) => exit::FILE,
            AppError::Auth(_) => exit::AUTH,
            AppError::Api(ApiError::ServerMessage(_)) => exit::SERVER_MESSAGE,
            AppError::Api(_) => exit::NETWORK,
            AppError::ControlFile(ControlFileError::Io { .. }) => exit::FILE,
            AppError::ControlFile(ControlFileError::MalformedLine { .. }) => exit::USAGE,
            AppError::Download(DownloadError::Io { .. }) => exit::FILE,
            AppError::Download(DownloadError::InvalidManifest { .. }) => exit::SERVER_MESSAGE,
            AppError::Download(_) => exit::NETWORK,
            AppError::Io { .. } => exit::FILE,
            AppError::Generic { .. } => exit::OTHER,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Authentication result type alias
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// API result type alias
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Usage result type alias
pub type UsageResult<T> = std::result::Result<T, UsageError>;

/// Error raised by the authenticated executor: either the credential flow or the call itself
#[derive(Error, Debug)]
pub enum ExecuteError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<ExecuteError> for AppError {
    fn from(error: ExecuteError) -> Self {
        match error {
            ExecuteError::Auth(e) => AppError::Auth(e),
            ExecuteError::Api(e) => AppError::Api(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permanent_download_errors_are_not_retryable() {
        let server_error = |status| DownloadError::ServerError {
            status,
            url: "https://rda.ucar.edu/dsrqst/file1.nc".to_string(),
        };

        assert!(!server_error(404).is_retryable());
        assert!(!server_error(403).is_retryable());
        assert!(server_error(429).is_retryable());
        assert!(server_error(503).is_retryable());
        assert!(!DownloadError::InvalidUrl {
            url: "a/b/file1.nc".to_string(),
            error: "relative URL without a base".to_string(),
        }
        .is_retryable());
    }

    #[test]
    fn test_exit_codes_per_class() {
        let usage = AppError::Usage(UsageError::InvalidDatasetId {
            id: "ds08".to_string(),
        });
        assert_eq!(usage.exit_code(), exit::USAGE);

        let auth = AppError::Auth(AuthError::InvalidCredentials);
        assert_eq!(auth.exit_code(), exit::AUTH);
        assert_eq!(auth.category(), "authentication");

        let status = AppError::Api(ApiError::Status {
            status: 500,
            body: String::new(),
        });
        assert_eq!(status.exit_code(), exit::NETWORK);

        let message = AppError::Api(ApiError::ServerMessage("Request not ready".into()));
        assert_eq!(message.exit_code(), exit::SERVER_MESSAGE);
        assert_eq!(message.category(), "server_message");

        let io = AppError::io(
            "rda_request_1",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(io.exit_code(), exit::FILE);
    }

    #[test]
    fn test_messages_name_the_problem() {
        let err = UsageError::InvalidDatasetId {
            id: "ds08".to_string(),
        };
        assert_eq!(err.to_string(), "'ds08' is not valid.");

        let err = AuthError::InvalidCredentials;
        assert!(err.to_string().contains("verify your login information"));

        let err = ApiError::ServerMessage("Request 123 is not complete".to_string());
        assert_eq!(err.to_string(), "Request 123 is not complete");

        let err = ControlFileError::MalformedLine {
            path: PathBuf::from("ctl.txt"),
            line: 3,
            content: "startdate".to_string(),
        };
        assert!(err.to_string().contains("line 3"));
        assert!(err.to_string().contains("ctl.txt"));
    }

    #[test]
    fn test_execute_error_conversion() {
        let app: AppError = ExecuteError::Auth(AuthError::InvalidCredentials).into();
        assert!(matches!(app, AppError::Auth(AuthError::InvalidCredentials)));

        let app: AppError = ExecuteError::Api(ApiError::Status {
            status: 404,
            body: "not found".into(),
        })
        .into();
        assert_eq!(app.exit_code(), exit::NETWORK);
    }
}
