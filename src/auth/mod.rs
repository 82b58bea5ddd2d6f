//! Authentication management for RDA credentials
//!
//! This module provides credential lookup, interactive prompting and the
//! plaintext credential file used between runs.
//!
//! # Examples
//!
//! ```rust,no_run
//! use rdams_client::auth::{resolve_credentials, CredentialStore, TerminalPrompt};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = CredentialStore::default();
//! let (credentials, source) = resolve_credentials(&store, &mut TerminalPrompt)?;
//! println!("Using credentials for {} from {}", credentials.username, source);
//! # Ok(())
//! # }
//! ```

pub mod credentials;

// Re-export main public API
pub use credentials::{
    credentials_from_env, get_auth_status, resolve_credentials, show_auth_status, AuthStatus,
    CredentialPrompt, CredentialSource, CredentialStore, Credentials, TerminalPrompt,
};
