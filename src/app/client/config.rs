//! HTTP client configuration and building logic

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::{http, limits};
use crate::errors::{ApiError, ApiResult};

/// Runtime configuration for the HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Deadline for a whole API call; file downloads have none
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
        }
    }
}

impl ClientConfig {
    /// Builds the HTTP client with the specified configuration
    ///
    /// Only the connect timeout is set on the client. `request_timeout` is
    /// applied per API call by [`HttpHandler`](super::HttpHandler), so a
    /// multi-gigabyte file stream is never cut off mid-transfer.
    pub fn build_http_client(&self) -> ApiResult<Client> {
        Client::builder()
            .cookie_store(true) // Session cookie from the login form authorizes file downloads
            .connect_timeout(self.connect_timeout)
            .user_agent(http::USER_AGENT)
            .build()
            .map_err(ApiError::Http)
    }
}
