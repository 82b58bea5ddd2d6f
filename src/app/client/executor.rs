//! Authenticated API call execution
//!
//! Every API call goes through [`RequestExecutor::execute`], which owns the
//! credential retry flow: a first HTTP 401 re-prompts once, a second one is
//! fatal, and credentials that succeed are written to the credential file.

use crate::app::client::http::{RawResponse, Transport};
use crate::app::models::ResponseBody;
use crate::app::router::ApiRequest;
use crate::auth::{CredentialPrompt, CredentialStore, Credentials};
use crate::errors::{ApiError, AuthError, ExecuteError};

/// Attempts allowed before a 401 becomes fatal
const MAX_AUTH_ATTEMPTS: u32 = 2;

/// Where the executor is in the credential flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticating { attempt: u32 },
    Authenticated,
    Failed,
}

/// Successful API response together with the credentials that produced it
#[derive(Debug, Clone)]
pub struct AuthenticatedResponse {
    pub body: Vec<u8>,
    pub credentials: Credentials,
    pub attempts: u32,
}

impl AuthenticatedResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn classify(&self) -> ResponseBody {
        ResponseBody::classify(&self.text())
    }
}

/// Runs API calls with the 401 retry flow over any [`Transport`]
pub struct RequestExecutor<'a, T: Transport + ?Sized> {
    transport: &'a T,
    store: &'a CredentialStore,
    state: AuthState,
}

impl<'a, T: Transport + ?Sized> RequestExecutor<'a, T> {
    pub fn new(transport: &'a T, store: &'a CredentialStore) -> Self {
        Self {
            transport,
            store,
            state: AuthState::Unauthenticated,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Perform `request` with `credentials`
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` after two consecutive 401s,
    /// `ApiError::Status` for any other non-success status, and
    /// `AuthError::CredentialStorage` if working credentials cannot be saved.
    pub async fn execute(
        &mut self,
        request: &ApiRequest,
        credentials: Credentials,
        prompt: &mut dyn CredentialPrompt,
    ) -> Result<AuthenticatedResponse, ExecuteError> {
        let mut credentials = credentials;
        let mut attempt = 1;

        loop {
            self.state = AuthState::Authenticating { attempt };
            let response = self.transport.send(request, &credentials).await?;

            if response.is_unauthorized() {
                if attempt >= MAX_AUTH_ATTEMPTS {
                    tracing::warn!(
                        "Credentials for {} rejected {} times",
                        credentials.username,
                        attempt
                    );
                    self.state = AuthState::Failed;
                    return Err(AuthError::InvalidCredentials.into());
                }

                tracing::info!("Credentials for {} rejected, prompting again", credentials.username);
                prompt.notify_rejected();
                credentials = prompt.prompt()?;
                attempt += 1;
                continue;
            }

            return self.finish(response, credentials, attempt);
        }
    }

    fn finish(
        &mut self,
        response: RawResponse,
        credentials: Credentials,
        attempts: u32,
    ) -> Result<AuthenticatedResponse, ExecuteError> {
        if !response.is_success() {
            self.state = AuthState::Failed;
            return Err(ApiError::Status {
                status: response.status,
                body: response.text(),
            }
            .into());
        }

        self.store.save(&credentials)?;
        self.state = AuthState::Authenticated;

        Ok(AuthenticatedResponse {
            body: response.body,
            credentials,
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::tempdir;
    use url::Url;

    use crate::app::router::HttpMethod;
    use crate::errors::{ApiResult, AuthResult, DownloadResult};

    /// Replays canned statuses and records the usernames it was called with
    struct ScriptedTransport {
        statuses: Mutex<Vec<u16>>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(statuses: &[u16]) -> Self {
            Self {
                statuses: Mutex::new(statuses.iter().rev().copied().collect()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(
            &self,
            _request: &ApiRequest,
            credentials: &Credentials,
        ) -> ApiResult<RawResponse> {
            self.seen.lock().unwrap().push(credentials.username.clone());
            let status = self.statuses.lock().unwrap().pop().unwrap_or(200);
            let body = if status == 200 { "{\"status\":\"ok\"}" } else { "denied" };
            Ok(RawResponse::new(status, body))
        }

        async fn login(&self, _login_url: &Url, _credentials: &Credentials) -> AuthResult<()> {
            Ok(())
        }

        async fn fetch_to_file(&self, _url: &str, _destination: &Path) -> DownloadResult<u64> {
            Ok(0)
        }
    }

    struct FixedPrompt {
        answer: Credentials,
        prompts: usize,
        rejections: usize,
    }

    impl FixedPrompt {
        fn new(username: &str, password: &str) -> Self {
            Self {
                answer: Credentials::new(username, password),
                prompts: 0,
                rejections: 0,
            }
        }
    }

    impl CredentialPrompt for FixedPrompt {
        fn prompt(&mut self) -> AuthResult<Credentials> {
            self.prompts += 1;
            Ok(self.answer.clone())
        }

        fn notify_rejected(&mut self) {
            self.rejections += 1;
        }
    }

    fn summary_request() -> ApiRequest {
        ApiRequest {
            method: HttpMethod::Get,
            url: Url::parse("https://rda.ucar.edu/apps/summary/ds083.2").unwrap(),
            body: None,
        }
    }

    #[tokio::test]
    async fn test_success_saves_credentials() {
        let temp_dir = tempdir().unwrap();
        let store = CredentialStore::new(temp_dir.path().join("rdamspw.txt"));
        let transport = ScriptedTransport::new(&[200]);
        let mut prompt = FixedPrompt::new("unused", "unused");

        let mut executor = RequestExecutor::new(&transport, &store);
        let response = executor
            .execute(&summary_request(), Credentials::new("jdoe", "secret"), &mut prompt)
            .await
            .unwrap();

        assert_eq!(response.attempts, 1);
        assert_eq!(executor.state(), AuthState::Authenticated);
        assert!(matches!(response.classify(), ResponseBody::Json(_)));
        assert_eq!(prompt.prompts, 0);

        let saved = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(saved, "jdoe,secret");
    }

    #[tokio::test]
    async fn test_single_401_reprompts_and_succeeds() {
        let temp_dir = tempdir().unwrap();
        let store = CredentialStore::new(temp_dir.path().join("rdamspw.txt"));
        let transport = ScriptedTransport::new(&[401, 200]);
        let mut prompt = FixedPrompt::new("jdoe", "right");

        let mut executor = RequestExecutor::new(&transport, &store);
        let response = executor
            .execute(&summary_request(), Credentials::new("jdoe", "wrong"), &mut prompt)
            .await
            .unwrap();

        assert_eq!(response.attempts, 2);
        assert_eq!(prompt.prompts, 1);
        assert_eq!(prompt.rejections, 1);
        assert_eq!(transport.calls().len(), 2);
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "jdoe,right");
    }

    #[tokio::test]
    async fn test_two_401s_are_fatal_and_nothing_is_saved() {
        let temp_dir = tempdir().unwrap();
        let store = CredentialStore::new(temp_dir.path().join("rdamspw.txt"));
        let transport = ScriptedTransport::new(&[401, 401, 200]);
        let mut prompt = FixedPrompt::new("jdoe", "still-wrong");

        let mut executor = RequestExecutor::new(&transport, &store);
        let result = executor
            .execute(&summary_request(), Credentials::new("jdoe", "wrong"), &mut prompt)
            .await;

        assert!(matches!(
            result,
            Err(ExecuteError::Auth(AuthError::InvalidCredentials))
        ));
        assert_eq!(executor.state(), AuthState::Failed);
        assert_eq!(transport.calls().len(), 2);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_other_status_is_not_retried() {
        let temp_dir = tempdir().unwrap();
        let store = CredentialStore::new(temp_dir.path().join("rdamspw.txt"));
        let transport = ScriptedTransport::new(&[500]);
        let mut prompt = FixedPrompt::new("unused", "unused");

        let mut executor = RequestExecutor::new(&transport, &store);
        let result = executor
            .execute(&summary_request(), Credentials::new("jdoe", "secret"), &mut prompt)
            .await;

        match result {
            Err(ExecuteError::Api(ApiError::Status { status, body })) => {
                assert_eq!(status, 500);
                assert_eq!(body, "denied");
            }
            other => panic!("Expected ApiError::Status, got {:?}", other),
        }
        assert_eq!(prompt.prompts, 0);
        assert!(!store.path().exists());
    }
}
