//! Credential management for RDA authentication
//!
//! Credentials live in a single-line plaintext file (`username,password`)
//! next to where the tool is run. The password is stored unencrypted; the
//! file is created owner-only on Unix but anyone who can read it can read
//! the password.
//!
//! Lookup order is environment variables, then the credential file, then an
//! interactive prompt.

use std::env;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::constants::{auth, env as env_constants};
use crate::errors::{AuthError, AuthResult};

/// An RDA username/password pair
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parse a credential file line
    ///
    /// Only the first comma separates the fields, so the password keeps any
    /// commas of its own: `user,pa:ss,word` has password `pa:ss,word`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (username, password) = line.split_once(auth::CREDENTIAL_SEPARATOR)?;
        Some(Self::new(username, password))
    }

    /// The `username,password` form written to the credential file
    pub fn to_line(&self) -> String {
        format!(
            "{}{}{}",
            self.username,
            auth::CREDENTIAL_SEPARATOR,
            self.password
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where a set of credentials came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    File,
    Prompt,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CredentialSource::Environment => "environment",
            CredentialSource::File => "credential file",
            CredentialSource::Prompt => "prompt",
        };
        f.write_str(name)
    }
}

/// Source of credentials typed by the user
pub trait CredentialPrompt {
    /// Ask for a username and a masked password
    fn prompt(&mut self) -> AuthResult<Credentials>;

    /// Called when the server rejected the previous credentials, before re-prompting
    fn notify_rejected(&mut self) {}
}

/// Prompts on the controlling terminal; the password is read without echo
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn prompt(&mut self) -> AuthResult<Credentials> {
        print!("{}", auth::USERNAME_PROMPT);
        io::stdout().flush().map_err(AuthError::Prompt)?;

        let mut username = String::new();
        io::stdin()
            .read_line(&mut username)
            .map_err(AuthError::Prompt)?;
        let username = username.trim().to_string();

        if username.is_empty() {
            return Err(AuthError::InvalidInput {
                reason: "Username cannot be empty".to_string(),
            });
        }

        let password = rpassword::prompt_password(auth::PASSWORD_PROMPT).map_err(AuthError::Prompt)?;

        Ok(Credentials::new(username, password))
    }

    fn notify_rejected(&mut self) {
        println!("RDA username and password invalid.  Please try again\n");
    }
}

/// Local plaintext credential file
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(auth::CREDENTIAL_FILE)
    }
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read stored credentials
    ///
    /// Returns `Ok(None)` when the file is missing, empty, or has no comma.
    pub fn load(&self) -> AuthResult<Option<Credentials>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No credential file at {}", self.path.display());
                return Ok(None);
            }
            Err(source) => {
                return Err(AuthError::CredentialStorage {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let line = content.lines().next().unwrap_or("");
        if line.is_empty() {
            return Ok(None);
        }

        match Credentials::parse_line(line) {
            Some(credentials) => {
                debug!(
                    "Loaded credentials for {} from {}",
                    credentials.username,
                    self.path.display()
                );
                Ok(Some(credentials))
            }
            None => {
                warn!(
                    "Ignoring malformed credential file {} (expected username,password)",
                    self.path.display()
                );
                Ok(None)
            }
        }
    }

    /// Overwrite the credential file with `username,password`
    pub fn save(&self, credentials: &Credentials) -> AuthResult<()> {
        let storage_error = |source| AuthError::CredentialStorage {
            path: self.path.clone(),
            source,
        };

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(auth::CREDENTIAL_FILE_PERMISSIONS);
        }

        let mut file = options.open(&self.path).map_err(storage_error)?;
        file.write_all(credentials.to_line().as_bytes())
            .map_err(storage_error)?;

        debug!(
            "Saved credentials for {} to {}",
            credentials.username,
            self.path.display()
        );
        Ok(())
    }

    /// Delete the credential file; returns whether there was one
    pub fn clear(&self) -> AuthResult<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(AuthError::CredentialStorage {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Credentials from `RDAMS_USERNAME` / `RDAMS_PASSWORD`, when both are set and non-empty
pub fn credentials_from_env() -> Option<Credentials> {
    credentials_from_lookup(|key| env::var(key).ok())
}

fn credentials_from_lookup<F>(lookup: F) -> Option<Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    let username = lookup(env_constants::USERNAME)?;
    let password = lookup(env_constants::PASSWORD)?;
    if username.is_empty() || password.is_empty() {
        return None;
    }
    Some(Credentials::new(username, password))
}

/// Find credentials: environment, then the store, then the prompt
pub fn resolve_credentials(
    store: &CredentialStore,
    prompt: &mut dyn CredentialPrompt,
) -> AuthResult<(Credentials, CredentialSource)> {
    resolve_credentials_with(store, prompt, |key| env::var(key).ok())
}

/// `resolve_credentials` with the environment read through `lookup`
fn resolve_credentials_with<F>(
    store: &CredentialStore,
    prompt: &mut dyn CredentialPrompt,
    lookup: F,
) -> AuthResult<(Credentials, CredentialSource)>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(credentials) = credentials_from_lookup(lookup) {
        debug!("Using credentials from environment");
        return Ok((credentials, CredentialSource::Environment));
    }
    if let Some(credentials) = store.load()? {
        return Ok((credentials, CredentialSource::File));
    }
    Ok((prompt.prompt()?, CredentialSource::Prompt))
}

/// Authentication status information
#[derive(Debug, Clone)]
pub struct AuthStatus {
    /// Whether both environment variables are set
    pub env_credentials: bool,
    /// Credential file location
    pub credential_file: PathBuf,
    /// Username stored in the credential file, if readable
    pub stored_username: Option<String>,
}

impl AuthStatus {
    /// Where the next command will take credentials from
    pub fn source(&self) -> CredentialSource {
        if self.env_credentials {
            CredentialSource::Environment
        } else if self.stored_username.is_some() {
            CredentialSource::File
        } else {
            CredentialSource::Prompt
        }
    }

    /// Get descriptive status message for display
    pub fn status_message(&self) -> String {
        match self.source() {
            CredentialSource::Environment => format!(
                "Using {} and {} from the environment",
                env_constants::USERNAME,
                env_constants::PASSWORD
            ),
            CredentialSource::File => format!(
                "Using stored credentials for '{}'",
                self.stored_username.as_deref().unwrap_or_default()
            ),
            CredentialSource::Prompt => {
                "No stored credentials - you will be prompted on the next request".to_string()
            }
        }
    }
}

/// Check current authentication status
pub fn get_auth_status(store: &CredentialStore) -> AuthStatus {
    let stored_username = store
        .load()
        .ok()
        .flatten()
        .map(|credentials| credentials.username);

    AuthStatus {
        env_credentials: credentials_from_env().is_some(),
        credential_file: store.path().to_path_buf(),
        stored_username,
    }
}

/// Show current authentication status
pub fn show_auth_status(store: &CredentialStore) {
    let status = get_auth_status(store);

    println!("RDA Authentication Status");
    println!("=========================");
    println!();
    println!("Credential file: {}", status.credential_file.display());
    println!(
        "Stored username: {}",
        status.stored_username.as_deref().unwrap_or("Not set")
    );
    println!(
        "Environment:     {}",
        if status.env_credentials { "Set" } else { "Not set" }
    );
    println!();
    println!("Status: {}", status.status_message());

    if status.source() == CredentialSource::File {
        println!();
        println!("Note: the password is stored in plaintext in the credential file.");
    }
}
