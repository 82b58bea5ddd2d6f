//! rdams CLI application
//!
//! Command-line interface for the NCAR Research Data Archive REST API.

use std::process;

use tracing::{debug, error, info};
use tracing_subscriber::{fmt, EnvFilter};

use rdams_client::cli::{handle_api, handle_auth, handle_config, Cli, Commands};
use rdams_client::config::AppConfig;
use rdams_client::errors::{ApiError, AppError, Result};

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        error!("{} failure: {}", e.category(), e);
        report_error(&e);
        process::exit(e.exit_code());
    }
}

/// Show a failure to the user
///
/// Server messages are the server's own words and go to stdout unchanged.
fn report_error(e: &AppError) {
    match e {
        AppError::Api(ApiError::ServerMessage(message)) => println!("{}", message),
        _ => eprintln!("Error: {}", e),
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    let config = AppConfig::load(cli.global.config.clone()).await?;

    init_logging(&cli, &config);
    info!("rdams v{} starting", env!("CARGO_PKG_VERSION"));

    if let Some(command) = cli.command.api_command() {
        info!("Executing {} command", command.verb());
        return handle_api(command, &config).await;
    }

    match cli.command {
        Commands::Auth(args) => handle_auth(args, &config).await,
        Commands::Config(args) => handle_config(args, &config).await,
        _ => Ok(()),
    }
}

/// Initialize logging based on CLI verbosity settings
fn init_logging(cli: &Cli, config: &AppConfig) {
    let level = cli
        .log_level()
        .map(|level| level.to_string().to_lowercase())
        .unwrap_or_else(|| config.logging.level.clone());

    let mut filter = EnvFilter::from_default_env();
    match format!("rdams_client={}", level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring invalid log level '{}': {}", level, e),
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose) // Show levels only in very verbose mode
        .with_writer(std::io::stderr)
        .init();

    debug!("Log level: {}", level);
}
