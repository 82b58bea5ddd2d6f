//! Application constants for the RDA client
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Username override, checked before the credential file
    pub const USERNAME: &str = "RDAMS_USERNAME";

    /// Password override, checked before the credential file
    pub const PASSWORD: &str = "RDAMS_PASSWORD";

    /// Overrides `[api].base_url`
    pub const BASE_URL: &str = "RDAMS_BASE_URL";

    /// Overrides `[api].login_url`
    pub const LOGIN_URL: &str = "RDAMS_LOGIN_URL";

    /// Overrides `[credentials].file`
    pub const CREDENTIAL_FILE: &str = "RDAMS_CREDENTIAL_FILE";

    /// Overrides `[download].root`
    pub const DOWNLOAD_ROOT: &str = "RDAMS_DOWNLOAD_ROOT";
}

/// RDA service URLs and endpoint path segments
pub mod rda {
    /// REST API base URL. Must end with a slash so endpoint paths join under it.
    pub const BASE_URL: &str = "https://rda.ucar.edu/apps/";

    /// Login form used to obtain the session cookie for file downloads
    pub const LOGIN_URL: &str = "https://rda.ucar.edu/cgi-bin/login";

    /// Account page users are sent to after repeated login failures
    pub const ACCOUNT_URL: &str = "https://rda.ucar.edu";

    pub const SUMMARY_PATH: &str = "summary";
    pub const METADATA_PATH: &str = "metadata";
    pub const PARAM_SUMMARY_PATH: &str = "paramsummary";
    pub const REQUEST_PATH: &str = "request";
    pub const TEMPLATE_PATH: &str = "template";
    pub const HELP_PATH: &str = "help";
    pub const FORMATTED_SUFFIX: &str = "formatted";
    pub const FILELIST_SUFFIX: &str = "filelist";
    pub const GLOBUS_SUFFIX: &str = "-globus_download";
}

/// Authentication and credential-related constants
pub mod auth {
    /// Default credential file, relative to the working directory
    pub const CREDENTIAL_FILE: &str = "./rdamspw.txt";

    /// Separator between username and password in the credential file
    pub const CREDENTIAL_SEPARATOR: char = ',';

    /// File permissions for the credential file (Unix only) - owner read/write only
    #[cfg(unix)]
    pub const CREDENTIAL_FILE_PERMISSIONS: u32 = 0o600;

    pub const USERNAME_PROMPT: &str = "Enter your RDA username or email: ";
    pub const PASSWORD_PROMPT: &str = "Enter your RDA password: ";
}

/// Dataset identifier rules
pub mod dataset {
    /// Prefix every canonical dataset id starts with
    pub const PREFIX: &str = "ds";

    /// Total length of a canonical id such as `ds083.2`
    pub const ID_LENGTH: usize = 7;

    /// Placeholder used in file names when no dataset id was given
    pub const PLACEHOLDER: &str = "dsnnn.n";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("rdams-client/", env!("CARGO_PKG_VERSION"));

    /// Default deadline for an API call. Metadata queries can be slow.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// HTTP 401
    pub const UNAUTHORIZED: u16 = 401;
}

/// Rate limiting and retry configuration
pub mod limits {
    use super::Duration;

    /// Default request pacing (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 15;

    /// Default attempts per file in a bulk download
    pub const DEFAULT_DOWNLOAD_ATTEMPTS: u32 = 3;

    /// Base delay for exponential backoff between download attempts
    pub const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

    /// Upper bound for a single backoff delay
    pub const MAX_BACKOFF: Duration = Duration::from_secs(60);
}

/// File operation constants
pub mod files {
    /// Suffix for in-flight downloads, renamed away on success
    pub const PARTIAL_FILE_SUFFIX: &str = ".part";

    /// Prefix of per-request download directories
    pub const REQUEST_DIR_PREFIX: &str = "rda_request_";

    /// Suffix of control-file templates written by `get_control_file_template`
    pub const CONTROL_FILE_SUFFIX: &str = "_control_file";

    /// Comment marker in control files
    pub const CONTROL_FILE_COMMENT: char = '#';

    /// Project-local configuration file
    pub const LOCAL_CONFIG_FILE: &str = "./rdams.toml";

    /// Directory under the user config dir holding `config.toml`
    pub const CONFIG_DIR_NAME: &str = "rdams";
}

/// Progress reporting
pub mod progress {
    /// Number of cells in the text progress bar
    pub const BAR_LENGTH: usize = 20;

    pub const HALT_STATUS: &str = "Halt...";
    pub const DONE_STATUS: &str = "Done...";
}

/// Process exit codes, one per failure class
pub mod exit {
    pub const OTHER: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NETWORK: i32 = 4;
    pub const FILE: i32 = 5;
    pub const SERVER_MESSAGE: i32 = 6;
}

// Re-export commonly used constants for convenience
pub use auth::CREDENTIAL_FILE;
pub use env::{PASSWORD as ENV_PASSWORD, USERNAME as ENV_USERNAME};
pub use http::USER_AGENT;
pub use limits::{DEFAULT_DOWNLOAD_ATTEMPTS, DEFAULT_RATE_LIMIT_RPS};
pub use rda::{BASE_URL as RDA_BASE_URL, LOGIN_URL as RDA_LOGIN_URL};
