//! Prelude module for the rdams client library
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use rdams_client::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use rdams_client::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None).await?;
//!     let router = Router::new(config.base_url()?, &config.download.root);
//!     let route = router.route(&ApiCommand::Status {
//!         request_index: None,
//!         dsid: None,
//!     })?;
//!     println!("{} {}", route.request.method, route.request.url);
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Essential app components
pub use crate::app::{
    ApiCommand, ApiRequest, BulkDownloader, ClientConfig, ControlFile, DatasetId,
    DownloadSummary, FileManifest, ProgressSink, RdaClient, RequestExecutor, RequestIndex,
    ResponseBody, RetryPolicy, Router, Transport,
};

// Authentication
pub use crate::auth::{
    get_auth_status, resolve_credentials, AuthStatus, CredentialPrompt, CredentialStore,
    Credentials,
};

// Configuration
pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{
    DEFAULT_DOWNLOAD_ATTEMPTS, DEFAULT_RATE_LIMIT_RPS, ENV_PASSWORD, ENV_USERNAME, USER_AGENT,
};

pub use std::path::{Path, PathBuf};

pub use tokio;
