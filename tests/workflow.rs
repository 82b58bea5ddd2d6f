//! Integration tests for the request/download workflow
//!
//! These tests drive routing, the authenticated executor and the bulk
//! downloader through an in-memory transport, covering credential retry,
//! credential persistence and resumed downloads without a network.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rdams_client::app::{
    ApiCommand, ApiRequest, BulkDownloader, FileManifest, HttpMethod, ProgressSink, RawResponse,
    RequestExecutor, ResponseAction, RetryPolicy, Router, Transport,
};
use rdams_client::auth::{CredentialPrompt, CredentialStore, Credentials};
use rdams_client::errors::{
    ApiResult, AuthError, AuthResult, DownloadError, DownloadResult, ExecuteError,
};
use tempfile::TempDir;
use url::Url;

/// A fake RDA server: one password is accepted and file URLs map to content
struct FakeRda {
    password: String,
    responses: HashMap<String, String>,
    files: HashMap<String, Vec<u8>>,
    api_calls: Mutex<Vec<(HttpMethod, String)>>,
    fetches: Mutex<Vec<String>>,
    logins: Mutex<u32>,
}

impl FakeRda {
    fn new(password: &str) -> Self {
        Self {
            password: password.to_string(),
            responses: HashMap::new(),
            files: HashMap::new(),
            api_calls: Mutex::new(Vec::new()),
            fetches: Mutex::new(Vec::new()),
            logins: Mutex::new(0),
        }
    }

    fn respond(mut self, url: &str, body: &str) -> Self {
        self.responses.insert(url.to_string(), body.to_string());
        self
    }

    fn serve_file(mut self, url: &str, content: &[u8]) -> Self {
        self.files.insert(url.to_string(), content.to_vec());
        self
    }

    fn api_call_count(&self) -> usize {
        self.api_calls.lock().unwrap().len()
    }

    fn fetched(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeRda {
    async fn send(&self, request: &ApiRequest, credentials: &Credentials) -> ApiResult<RawResponse> {
        self.api_calls
            .lock()
            .unwrap()
            .push((request.method, request.url.to_string()));

        if credentials.password != self.password {
            return Ok(RawResponse::new(401, "Unauthorized"));
        }
        match self.responses.get(request.url.as_str()) {
            Some(body) => Ok(RawResponse::new(200, body.as_str())),
            None => Ok(RawResponse::new(404, "Not Found")),
        }
    }

    async fn login(&self, _login_url: &Url, credentials: &Credentials) -> AuthResult<()> {
        if credentials.password != self.password {
            return Err(AuthError::LoginFailed { status: 403 });
        }
        *self.logins.lock().unwrap() += 1;
        Ok(())
    }

    async fn fetch_to_file(&self, url: &str, destination: &Path) -> DownloadResult<u64> {
        self.fetches.lock().unwrap().push(url.to_string());
        let content = self.files.get(url).ok_or_else(|| DownloadError::ServerError {
            status: 404,
            url: url.to_string(),
        })?;
        std::fs::write(destination, content).map_err(|source| DownloadError::Io {
            path: destination.to_path_buf(),
            source,
        })?;
        Ok(content.len() as u64)
    }
}

/// Answers every prompt with the same credentials
struct ScriptedPrompt {
    answer: Credentials,
    prompts: u32,
}

impl ScriptedPrompt {
    fn answering(username: &str, password: &str) -> Self {
        Self {
            answer: Credentials::new(username, password),
            prompts: 0,
        }
    }
}

impl CredentialPrompt for ScriptedPrompt {
    fn prompt(&mut self) -> AuthResult<Credentials> {
        self.prompts += 1;
        Ok(self.answer.clone())
    }
}

#[derive(Default)]
struct Fractions(Vec<f64>);

impl ProgressSink for Fractions {
    fn update(&mut self, fraction: f64) {
        self.0.push(fraction);
    }
}

fn router(root: &Path) -> Router {
    Router::new(Url::parse("https://rda.ucar.edu/apps/").unwrap(), root)
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 2,
        base_delay: std::time::Duration::from_millis(1),
    }
}

const FILELIST_URL: &str = "https://rda.ucar.edu/apps/request/123456/filelist";
const MANIFEST: &str = r#"{
    "https://rda.ucar.edu/dsrqst/a/b/file1.nc": "100",
    "https://rda.ucar.edu/dsrqst/a/b/file2.nc": 50
}"#;

fn fake_with_request() -> FakeRda {
    FakeRda::new("right")
        .respond(FILELIST_URL, MANIFEST)
        .serve_file("https://rda.ucar.edu/dsrqst/a/b/file1.nc", &[1u8; 100])
        .serve_file("https://rda.ucar.edu/dsrqst/a/b/file2.nc", &[2u8; 50])
}

#[tokio::test]
async fn test_rejected_password_is_reprompted_then_saved() {
    let temp_dir = TempDir::new().unwrap();
    let store = CredentialStore::new(temp_dir.path().join("rdamspw.txt"));
    let server = FakeRda::new("right").respond(
        "https://rda.ucar.edu/apps/summary/ds083.2",
        r#"{"dsid": "ds083.2"}"#,
    );
    let route = router(temp_dir.path())
        .route(&ApiCommand::Summary {
            dsid: Some("083.2".to_string()),
        })
        .unwrap();
    let mut prompt = ScriptedPrompt::answering("jdoe@example.com", "right");

    let response = RequestExecutor::new(&server, &store)
        .execute(
            &route.request,
            Credentials::new("jdoe@example.com", "stale"),
            &mut prompt,
        )
        .await
        .unwrap();

    assert_eq!(response.text(), r#"{"dsid": "ds083.2"}"#);
    assert_eq!(prompt.prompts, 1);
    assert_eq!(server.api_call_count(), 2);

    let saved = store.load().unwrap().unwrap();
    assert_eq!(saved, Credentials::new("jdoe@example.com", "right"));
}

#[tokio::test]
async fn test_second_rejection_stops_without_third_attempt() {
    let temp_dir = TempDir::new().unwrap();
    let store = CredentialStore::new(temp_dir.path().join("rdamspw.txt"));
    let server = fake_with_request();
    let route = router(temp_dir.path())
        .route(&ApiCommand::Purge {
            request_index: Some("123456".to_string()),
        })
        .unwrap();
    let mut prompt = ScriptedPrompt::answering("jdoe", "also-wrong");

    let result = RequestExecutor::new(&server, &store)
        .execute(&route.request, Credentials::new("jdoe", "wrong"), &mut prompt)
        .await;

    assert!(matches!(
        result,
        Err(ExecuteError::Auth(AuthError::InvalidCredentials))
    ));
    assert_eq!(server.api_call_count(), 2);
    assert_eq!(
        server.api_calls.lock().unwrap()[0].0,
        HttpMethod::Delete
    );
    assert!(!store.path().exists());
}

#[tokio::test]
async fn test_download_resumes_after_partial_run() {
    let temp_dir = TempDir::new().unwrap();
    let store = CredentialStore::new(temp_dir.path().join("rdamspw.txt"));
    let server = fake_with_request();
    let route = router(temp_dir.path())
        .route(&ApiCommand::Download {
            request_index: Some("123456".to_string()),
        })
        .unwrap();

    let ResponseAction::DownloadFiles { directory, .. } = route.action.clone() else {
        panic!("download should route to a file download");
    };
    assert_eq!(directory, temp_dir.path().join("rda_request_123456"));

    // A previous run finished file1 only
    std::fs::create_dir_all(&directory).unwrap();
    std::fs::write(directory.join("file1.nc"), [1u8; 100]).unwrap();

    let mut prompt = ScriptedPrompt::answering("unused", "unused");
    let response = RequestExecutor::new(&server, &store)
        .execute(&route.request, Credentials::new("jdoe", "right"), &mut prompt)
        .await
        .unwrap();
    let manifest = FileManifest::from_response(response.classify()).unwrap();
    assert_eq!(manifest.len(), 2);

    server
        .login(&Url::parse("https://rda.ucar.edu/cgi-bin/login").unwrap(), &response.credentials)
        .await
        .unwrap();

    let mut progress = Fractions::default();
    let summary = BulkDownloader::new(&server, fast_retry())
        .download_all(&manifest, &directory, &mut progress)
        .await
        .unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.downloaded, 1);
    assert_eq!(
        server.fetched(),
        vec!["https://rda.ucar.edu/dsrqst/a/b/file2.nc"]
    );
    assert_eq!(progress.0, vec![0.0, 0.5, 1.0]);
    assert_eq!(*server.logins.lock().unwrap(), 1);
    assert_eq!(std::fs::read(directory.join("file2.nc")).unwrap(), vec![2u8; 50]);
}

#[tokio::test]
async fn test_missing_remote_file_halts_the_download() {
    let temp_dir = TempDir::new().unwrap();
    let directory = temp_dir.path().join("rda_request_1");
    let server = FakeRda::new("right");
    let manifest = FileManifest::from_response(rdams_client::app::ResponseBody::classify(
        r#"{"https://rda.ucar.edu/dsrqst/gone.nc": "10"}"#,
    ))
    .unwrap();

    let mut progress = Fractions::default();
    let result = BulkDownloader::new(&server, fast_retry())
        .download_all(&manifest, &directory, &mut progress)
        .await;

    match result {
        Err(DownloadError::ServerError { status, .. }) => assert_eq!(status, 404),
        other => panic!("Expected a 404 ServerError, got {:?}", other),
    }
    assert_eq!(progress.0.last().copied(), Some(-1.0));
    // A missing file is permanent, so it is fetched once despite the retry budget
    assert_eq!(server.fetched().len(), 1);
    assert!(!directory.join("gone.nc.part").exists());
    assert!(!directory.join("gone.nc").exists());
}

#[tokio::test]
async fn test_submit_sends_control_file_as_json() {
    let temp_dir = TempDir::new().unwrap();
    let control_path = temp_dir.path().join("ds083.2_control_file");
    std::fs::write(
        &control_path,
        "# comment\ndataset=ds083.2\nstartdate=2020010100\n",
    )
    .unwrap();

    let route = router(temp_dir.path())
        .route(&ApiCommand::Submit {
            control_file: Some(control_path),
        })
        .unwrap();

    assert_eq!(route.request.method, HttpMethod::Post);
    assert_eq!(route.request.url.as_str(), "https://rda.ucar.edu/apps/request");
    assert_eq!(
        route.request.body,
        Some(serde_json::json!({"dataset": "ds083.2", "startdate": "2020010100"}))
    );
}
