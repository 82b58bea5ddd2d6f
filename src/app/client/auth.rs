//! RDA session login
//!
//! File downloads are authorized by a session cookie rather than basic auth.
//! The cookie comes from posting the login form; the client's cookie store
//! keeps it for every later request.

use reqwest::Client;
use url::Url;

use crate::auth::Credentials;
use crate::errors::{AuthError, AuthResult};

/// Handles RDA session login
pub struct AuthHandler;

impl AuthHandler {
    /// Posts the login form (`email`, `password`, `action=login`)
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Http` if the request fails and
    /// `AuthError::LoginFailed` if the server answers with a non-success status.
    pub async fn login(client: &Client, login_url: &Url, credentials: &Credentials) -> AuthResult<()> {
        tracing::info!("Starting RDA session login for user: {}", credentials.username);

        let response = client
            .post(login_url.clone())
            .form(&Self::login_form(credentials))
            .send()
            .await
            .map_err(AuthError::Http)?;

        let status = response.status();
        tracing::debug!("Login response status: {}", status);
        tracing::debug!("Login response final URL: {}", response.url());

        if !status.is_success() {
            tracing::warn!("RDA session login failed with HTTP {}", status);
            return Err(AuthError::LoginFailed {
                status: status.as_u16(),
            });
        }

        tracing::info!("Session established for {}", credentials.username);
        Ok(())
    }

    fn login_form(credentials: &Credentials) -> [(&'static str, &str); 3] {
        [
            ("email", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
            ("action", "login"),
        ]
    }
}
