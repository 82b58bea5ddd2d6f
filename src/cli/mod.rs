//! Command-line interface components
//!
//! This module contains CLI-specific code for the rdams application,
//! including argument parsing, command handlers and progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{
    AuthAction, AuthArgs, Cli, Commands, ConfigAction, ConfigArgs, DatasetArgs, FormattedArgs,
    GlobalArgs, RequestArgs, StatusArgs, SubmitArgs,
};
pub use commands::{handle_api, handle_auth, handle_config, handle_response};
pub use progress::{render_progress, ProgressDisplay, ProgressState};
