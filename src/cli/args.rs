//! Command-line argument parsing for the RDA client
//!
//! This module defines the CLI structure using clap derive macros. Each API
//! verb keeps its original name and short alias; positional arguments are
//! optional at the clap level so the router can report the exact expected
//! invocation when one is missing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::app::ApiCommand;

/// rdams - query the NCAR Research Data Archive REST API
#[derive(Parser, Debug)]
#[command(
    name = "rdams",
    version,
    about = "Queries the NCAR RDA REST API",
    long_about = "Query dataset metadata, submit subset requests, check request status and download\nrequest files from the NCAR Research Data Archive.",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - only errors are logged
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Get a summary of the given dataset, or of all datasets
    #[command(name = "get_summary", visible_aliases = ["g", "get-summary"])]
    GetSummary(DatasetArgs),

    /// Get metadata for a given dataset
    #[command(name = "get_metadata", visible_aliases = ["gm", "get-metadata"])]
    GetMetadata(FormattedArgs),

    /// Get only parameters for a given dataset
    #[command(name = "get_param_summary", visible_aliases = ["gpm", "get-param-summary"])]
    GetParamSummary(FormattedArgs),

    /// Submit a request using a control file
    #[command(visible_alias = "s")]
    Submit(SubmitArgs),

    /// Get the status of a request, or of all your requests
    #[command(name = "get_status", visible_aliases = ["gs", "get-status"])]
    GetStatus(StatusArgs),

    /// Download data given a request index
    #[command(visible_alias = "d")]
    Download(RequestArgs),

    /// Start a Globus transfer for a given request index
    #[command(name = "globus_download", visible_aliases = ["gd", "globus-download"])]
    GlobusDownload(RequestArgs),

    /// Get a template control file used for subsetting
    #[command(
        name = "get_control_file_template",
        visible_aliases = ["gt", "get-control-file-template"]
    )]
    GetControlFileTemplate(DatasetArgs),

    /// Purge a request from the server
    Purge(RequestArgs),

    /// Show the server's API help
    Help,

    /// Manage stored credentials
    Auth(AuthArgs),

    /// Inspect the effective configuration
    Config(ConfigArgs),
}

/// A verb taking an optional dataset id
#[derive(Args, Debug, Clone)]
pub struct DatasetArgs {
    /// Dataset id, e.g. ds083.2 or 083.2
    #[arg(value_name = "dsnnn.n")]
    pub dsid: Option<String>,
}

/// A verb taking a dataset id and the formatted flag
#[derive(Args, Debug, Clone)]
pub struct FormattedArgs {
    /// Dataset id, e.g. ds083.2 or 083.2
    #[arg(value_name = "dsnnn.n")]
    pub dsid: Option<String>,

    /// Request the formatted variant
    #[arg(short, long)]
    pub formatted: bool,
}

/// Arguments for the submit command
#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    /// Control file of key=value lines
    #[arg(value_name = "control_file_name")]
    pub control_file: Option<PathBuf>,
}

/// Arguments for the status command
#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    /// Request index
    #[arg(value_name = "RequestIndex")]
    pub request_index: Option<String>,

    /// Narrow the status to one dataset
    #[arg(value_name = "dsnnn.n")]
    pub dsid: Option<String>,
}

/// A verb taking a request index
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Request index
    #[arg(value_name = "RequestIndex")]
    pub request_index: Option<String>,
}

/// Arguments for authentication management
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub action: AuthAction,
}

/// Authentication actions
#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Show where credentials would be taken from
    Status,

    /// Delete the stored credential file
    Clear,
}

/// Arguments for configuration inspection
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    ///
    /// `None` when no flag was given, leaving the configured level in effect.
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}

impl Commands {
    /// The API call this command performs, if it is one
    pub fn api_command(&self) -> Option<ApiCommand> {
        let command = match self {
            Commands::GetSummary(args) => ApiCommand::Summary {
                dsid: args.dsid.clone(),
            },
            Commands::GetMetadata(args) => ApiCommand::Metadata {
                dsid: args.dsid.clone(),
                formatted: args.formatted,
            },
            Commands::GetParamSummary(args) => ApiCommand::ParamSummary {
                dsid: args.dsid.clone(),
                formatted: args.formatted,
            },
            Commands::Submit(args) => ApiCommand::Submit {
                control_file: args.control_file.clone(),
            },
            Commands::GetStatus(args) => ApiCommand::Status {
                request_index: args.request_index.clone(),
                dsid: args.dsid.clone(),
            },
            Commands::Download(args) => ApiCommand::Download {
                request_index: args.request_index.clone(),
            },
            Commands::GlobusDownload(args) => ApiCommand::GlobusDownload {
                request_index: args.request_index.clone(),
            },
            Commands::GetControlFileTemplate(args) => ApiCommand::ControlFileTemplate {
                dsid: args.dsid.clone(),
            },
            Commands::Purge(args) => ApiCommand::Purge {
                request_index: args.request_index.clone(),
            },
            Commands::Help => ApiCommand::Help,
            Commands::Auth(_) | Commands::Config(_) => return None,
        };
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("rdams").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_short_aliases_map_to_verbs() {
        let cli = parse(&["g", "ds083.2"]);
        assert_eq!(
            cli.command.api_command(),
            Some(ApiCommand::Summary {
                dsid: Some("ds083.2".to_string())
            })
        );

        let cli = parse(&["gm", "083.2", "-f"]);
        assert_eq!(
            cli.command.api_command(),
            Some(ApiCommand::Metadata {
                dsid: Some("083.2".to_string()),
                formatted: true
            })
        );

        let cli = parse(&["d", "123456"]);
        assert_eq!(cli.command.api_command().unwrap().verb(), "download");

        let cli = parse(&["get-control-file-template"]);
        assert_eq!(
            cli.command.api_command(),
            Some(ApiCommand::ControlFileTemplate { dsid: None })
        );
    }

    #[test]
    fn test_status_takes_index_then_dataset() {
        let cli = parse(&["get_status", "123456", "ds083.2"]);
        assert_eq!(
            cli.command.api_command(),
            Some(ApiCommand::Status {
                request_index: Some("123456".to_string()),
                dsid: Some("ds083.2".to_string())
            })
        );
    }

    #[test]
    fn test_help_verb_is_an_api_call() {
        let cli = parse(&["help"]);
        assert_eq!(cli.command.api_command(), Some(ApiCommand::Help));
    }

    #[test]
    fn test_local_commands_are_not_api_calls() {
        let cli = parse(&["auth", "status"]);
        assert!(cli.command.api_command().is_none());

        let cli = parse(&["config", "show"]);
        assert!(cli.command.api_command().is_none());
    }

    #[test]
    fn test_log_level() {
        let cli_quiet = parse(&["-q", "auth", "status"]);
        let cli_verbose = parse(&["auth", "status", "--verbose"]);
        let cli_default = parse(&["auth", "status"]);

        assert_eq!(cli_quiet.log_level(), Some(tracing::Level::ERROR));
        assert_eq!(cli_verbose.log_level(), Some(tracing::Level::INFO));
        assert_eq!(cli_default.log_level(), None);
    }
}
