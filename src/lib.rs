//! rdams client library
//!
//! A Rust client for the NCAR Research Data Archive REST API: dataset
//! summaries and metadata, subset request submission, request status, and
//! resumable download of request files.

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
