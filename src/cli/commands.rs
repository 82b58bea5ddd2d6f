//! Command handlers for the CLI
//!
//! API verbs are routed first, so usage errors surface before credentials
//! are read. The response is then printed, written to a template file, or
//! turned into a manifest and downloaded.

use std::path::Path;

use tracing::{debug, info};
use url::Url;

use crate::app::{
    ApiCommand, AuthenticatedResponse, BulkDownloader, DownloadSummary, FileManifest, RdaClient,
    ResponseAction, Router, Transport,
};
use crate::auth::{resolve_credentials, show_auth_status, CredentialStore, TerminalPrompt};
use crate::cli::args::{AuthAction, AuthArgs, ConfigAction, ConfigArgs};
use crate::cli::progress::ProgressDisplay;
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Handle an API verb end to end
pub async fn handle_api(command: ApiCommand, config: &AppConfig) -> Result<()> {
    let router = Router::new(config.base_url()?, &config.download.root);
    let route = router.route(&command)?;

    if let Some(banner) = route.banner {
        println!("\n{}\n", banner);
    }

    let store = CredentialStore::new(&config.credentials.file);
    let mut prompt = TerminalPrompt;
    let (credentials, source) = resolve_credentials(&store, &mut prompt)?;
    debug!("Using credentials from {}", source);

    let client = RdaClient::new(&config.client_config(), config.login_url()?)?;
    let response = client
        .execute(&route.request, credentials, &store, &mut prompt)
        .await?;
    info!(
        "{} succeeded after {} attempt(s)",
        command.verb(),
        response.attempts
    );

    handle_response(
        client.transport(),
        client.login_url(),
        route.action,
        response,
        config,
    )
    .await
}

/// Apply a route's response action to a successful response
pub async fn handle_response<T: Transport + ?Sized>(
    transport: &T,
    login_url: &Url,
    action: ResponseAction,
    response: AuthenticatedResponse,
    config: &AppConfig,
) -> Result<()> {
    match action {
        ResponseAction::Print => {
            println!("{}", response.text());
            Ok(())
        }
        ResponseAction::WriteTemplate { path } => {
            println!("\nWriting example control file to {}\n", path.display());
            std::fs::write(&path, &response.body).map_err(|e| AppError::io(&path, e))
        }
        ResponseAction::DownloadFiles {
            request_index,
            directory,
        } => {
            let manifest = FileManifest::from_response(response.classify())?;
            debug!(
                "Request {} lists {} files",
                request_index,
                manifest.len()
            );

            transport.login(login_url, &response.credentials).await?;

            println!("\n\nStarting Download.\n\n");
            let mut display =
                ProgressDisplay::new(directory_label(&directory), config.download.progress_bars);
            let summary = BulkDownloader::new(transport, config.retry_policy())
                .download_all(&manifest, &directory, &mut display)
                .await?;

            print_summary(&summary, &directory);
            Ok(())
        }
    }
}

/// Handle authentication management commands
pub async fn handle_auth(args: AuthArgs, config: &AppConfig) -> Result<()> {
    let store = CredentialStore::new(&config.credentials.file);
    match args.action {
        AuthAction::Status => show_auth_status(&store),
        AuthAction::Clear => {
            if store.clear()? {
                println!("Removed credential file {}", store.path().display());
            } else {
                println!("No credential file at {}", store.path().display());
            }
        }
    }
    Ok(())
}

/// Handle configuration commands
pub async fn handle_config(args: ConfigArgs, config: &AppConfig) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}

/// Directory as shown in progress output, without a leading `./`
fn directory_label(directory: &Path) -> String {
    directory
        .strip_prefix(".")
        .unwrap_or(directory)
        .display()
        .to_string()
}

fn print_summary(summary: &DownloadSummary, directory: &Path) {
    println!(
        "{} of {} files downloaded to {} ({} bytes), {} already present",
        summary.downloaded,
        summary.total,
        directory.display(),
        summary.bytes,
        summary.skipped
    );
}
