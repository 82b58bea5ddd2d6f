//! Core application logic for the RDA client
//!
//! This module contains the HTTP client, data models, control-file parsing,
//! the verb router and the bulk downloader.
//!
//! # Examples
//!
//! ```rust,no_run
//! use rdams_client::app::{ApiCommand, ClientConfig, RdaClient, Router};
//! use rdams_client::auth::{resolve_credentials, CredentialStore, TerminalPrompt};
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let router = Router::new(Url::parse("https://rda.ucar.edu/apps/")?, ".");
//! let route = router.route(&ApiCommand::Summary {
//!     dsid: Some("ds083.2".to_string()),
//! })?;
//!
//! let client = RdaClient::new(
//!     &ClientConfig::default(),
//!     Url::parse("https://rda.ucar.edu/cgi-bin/login")?,
//! )?;
//! let store = CredentialStore::default();
//! let mut prompt = TerminalPrompt;
//! let (credentials, _) = resolve_credentials(&store, &mut prompt)?;
//!
//! let response = client
//!     .execute(&route.request, credentials, &store, &mut prompt)
//!     .await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod control_file;
pub mod downloader;
pub mod models;
pub mod router;

// Re-export main public API
pub use client::{
    AuthState, AuthenticatedResponse, ClientConfig, RawResponse, RdaClient, RequestExecutor,
    RetryPolicy, Transport,
};
pub use control_file::ControlFile;
pub use downloader::{BulkDownloader, DownloadSummary, ProgressSink};
pub use models::{DatasetId, FileManifest, ManifestEntry, RequestIndex, ResponseBody};
pub use router::{ApiCommand, ApiRequest, HttpMethod, ResponseAction, Route, Router};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_structure() {
        let config = ClientConfig::default();
        assert!(config.rate_limit_rps > 0);
        assert_eq!(RetryPolicy::default().max_attempts, 3);
    }
}
