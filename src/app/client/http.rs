//! HTTP transport for the RDA API
//!
//! [`Transport`] is the seam between the request/download workflow and the
//! network. [`HttpHandler`] is the reqwest implementation: basic-auth API
//! calls, the session login form, and streamed file downloads sharing one
//! cookie store, paced by a rate limiter.

use std::num::NonZeroU32;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::app::client::auth::AuthHandler;
use crate::app::router::ApiRequest;
use crate::auth::Credentials;
use crate::constants::http;
use crate::errors::{
    ApiError, ApiResult, AuthResult, ConfigError, DownloadError, DownloadResult,
};

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == http::UNAUTHORIZED
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Network operations the client workflow depends on
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one API call with HTTP Basic Authentication
    ///
    /// Any HTTP status is a successful exchange; only transport failures are errors.
    async fn send(&self, request: &ApiRequest, credentials: &Credentials)
        -> ApiResult<RawResponse>;

    /// Post the login form so later file downloads carry the session cookie
    async fn login(&self, login_url: &Url, credentials: &Credentials) -> AuthResult<()>;

    /// Stream a remote file into `destination`, returning the bytes written
    async fn fetch_to_file(&self, url: &str, destination: &Path) -> DownloadResult<u64>;
}

/// reqwest-backed transport with request pacing
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    api_timeout: Duration,
    rate_limiter: RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>,
}

impl HttpHandler {
    /// Creates a new HttpHandler with the given client and rate limiting
    ///
    /// `api_timeout` bounds each API call. Login and file downloads are not
    /// given a total deadline.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the rate limit is zero
    pub fn new(
        client: Client,
        rate_limit_rps: u32,
        api_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let rate_limiter = Self::build_rate_limiter(rate_limit_rps)?;
        Ok(Self {
            client,
            api_timeout,
            rate_limiter,
        })
    }

    /// Builds the rate limiter with the specified rate limit
    fn build_rate_limiter(
        rate_limit_rps: u32,
    ) -> Result<RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>, ConfigError>
    {
        let rate = NonZeroU32::new(rate_limit_rps).ok_or_else(|| ConfigError::InvalidValue {
            field: "client.rate_limit_rps".to_string(),
            value: rate_limit_rps.to_string(),
            reason: "Rate limit must be non-zero".to_string(),
        })?;
        Ok(RateLimiter::direct(Quota::per_second(rate)))
    }

    async fn pace(&self) {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;
    }
}

#[async_trait]
impl Transport for HttpHandler {
    async fn send(
        &self,
        request: &ApiRequest,
        credentials: &Credentials,
    ) -> ApiResult<RawResponse> {
        self.pace().await;

        let mut builder = self
            .client
            .request(request.method.into(), request.url.clone())
            .basic_auth(&credentials.username, Some(&credentials.password))
            .timeout(self.api_timeout);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!("{} {}", request.method, request.url);
        let response = builder.send().await.map_err(ApiError::Http)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(ApiError::Http)?;
        tracing::debug!(
            "{} {} -> HTTP {} ({} bytes)",
            request.method,
            request.url,
            status,
            body.len()
        );

        Ok(RawResponse::new(status, body.to_vec()))
    }

    async fn login(&self, login_url: &Url, credentials: &Credentials) -> AuthResult<()> {
        self.pace().await;
        AuthHandler::login(&self.client, login_url, credentials).await
    }

    async fn fetch_to_file(&self, url: &str, destination: &Path) -> DownloadResult<u64> {
        let parsed_url = Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
            url: url.to_string(),
            error: e.to_string(),
        })?;

        self.pace().await;
        let response = self.client.get(parsed_url).send().await?;
        if !response.status().is_success() {
            return Err(DownloadError::ServerError {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let io_error = |source| DownloadError::Io {
            path: destination.to_path_buf(),
            source,
        };

        let mut file = File::create(destination).await.map_err(io_error)?;
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await.map_err(io_error)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_error)?;

        Ok(written)
    }
}
