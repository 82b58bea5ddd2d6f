//! HTTP client implementation for the RDA REST API
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `auth`: session login for file downloads
//! - `http`: the [`Transport`] seam and its reqwest implementation
//! - `executor`: authenticated API calls with the 401 retry flow
//! - `download`: file download operations with atomic writes

use url::Url;

use crate::app::router::ApiRequest;
use crate::auth::{CredentialPrompt, CredentialStore, Credentials};
use crate::errors::{AppError, ExecuteError};

pub mod auth;
pub mod config;
pub mod download;
pub mod executor;
pub mod http;

pub use config::ClientConfig;
pub use download::{DownloadHandler, RetryPolicy};
pub use executor::{AuthState, AuthenticatedResponse, RequestExecutor};
pub use http::{HttpHandler, RawResponse, Transport};

/// HTTP client for the RDA REST API
///
/// Wraps the rate-limited [`HttpHandler`] together with the login endpoint
/// used to establish a download session.
#[derive(Debug)]
pub struct RdaClient {
    http_handler: HttpHandler,
    login_url: Url,
}

impl RdaClient {
    /// Creates a new RdaClient from runtime client settings
    ///
    /// # Errors
    ///
    /// Returns `AppError::Api` if the HTTP client cannot be built and
    /// `AppError::Config` if the rate limit is zero.
    pub fn new(config: &ClientConfig, login_url: Url) -> Result<Self, AppError> {
        let client = config.build_http_client()?;
        let http_handler =
            HttpHandler::new(client, config.rate_limit_rps, config.request_timeout)?;

        tracing::debug!(
            "Created RDA client (API timeout {:?}, {} req/s)",
            config.request_timeout,
            config.rate_limit_rps
        );

        Ok(Self {
            http_handler,
            login_url,
        })
    }

    /// The transport shared by API calls and file downloads
    pub fn transport(&self) -> &HttpHandler {
        &self.http_handler
    }

    pub fn login_url(&self) -> &Url {
        &self.login_url
    }

    /// Performs an API call through the credential retry flow
    pub async fn execute(
        &self,
        request: &ApiRequest,
        credentials: Credentials,
        store: &CredentialStore,
        prompt: &mut dyn CredentialPrompt,
    ) -> Result<AuthenticatedResponse, ExecuteError> {
        RequestExecutor::new(&self.http_handler, store)
            .execute(request, credentials, prompt)
            .await
    }
}
