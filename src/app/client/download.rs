//! File download operations with atomic writes and bounded retry
//!
//! Each file is streamed into `<name>.part` and renamed into place only when
//! the transfer completes, so an interrupted run never leaves a truncated
//! file under the final name.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app::client::http::Transport;
use crate::constants::{files, limits};
use crate::errors::{DownloadError, DownloadResult};

/// Retry policy for a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per file, at least one
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each failure
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: limits::DEFAULT_DOWNLOAD_ATTEMPTS,
            base_delay: limits::RETRY_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based), capped at the maximum backoff
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .map_or(limits::MAX_BACKOFF, |delay| delay.min(limits::MAX_BACKOFF))
    }
}

/// File download operations handler
pub struct DownloadHandler<'a, T: Transport + ?Sized> {
    transport: &'a T,
    policy: RetryPolicy,
}

impl<'a, T: Transport + ?Sized> DownloadHandler<'a, T> {
    pub fn new(transport: &'a T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Downloads `url` to `destination`, retrying per the policy
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::MaxRetriesExceeded` once every attempt has
    /// failed, the error itself when it is not retryable, or
    /// `DownloadError::Io` if the finished file cannot be moved into place.
    pub async fn download_file(&self, url: &str, destination: &Path) -> DownloadResult<u64> {
        let temp_path = partial_path(destination);
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.transport.fetch_to_file(url, &temp_path).await {
                Ok(bytes) => {
                    if let Err(source) = tokio::fs::rename(&temp_path, destination).await {
                        discard_partial(&temp_path).await;
                        return Err(DownloadError::Io {
                            path: destination.to_path_buf(),
                            source,
                        });
                    }
                    tracing::info!(
                        "Downloaded {} ({} bytes)",
                        destination.display(),
                        bytes
                    );
                    return Ok(bytes);
                }
                Err(e) if !e.is_retryable() => {
                    discard_partial(&temp_path).await;
                    tracing::error!("Download of {} failed permanently: {}", url, e);
                    return Err(e);
                }
                Err(e) if attempt < max_attempts => {
                    let delay = self.policy.delay_after(attempt);
                    tracing::warn!(
                        "Download of {} failed (attempt {}/{}): {}. Retrying in {}ms",
                        url,
                        attempt,
                        max_attempts,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    discard_partial(&temp_path).await;
                    tracing::error!(
                        "Download of {} failed after {} attempts: {}",
                        url,
                        max_attempts,
                        e
                    );
                    return Err(DownloadError::MaxRetriesExceeded {
                        file: destination.display().to_string(),
                        attempts: max_attempts,
                        last_error: e.to_string(),
                    });
                }
            }
        }
    }
}

/// Best-effort removal of a leftover `.part` file
async fn discard_partial(temp_path: &Path) {
    if tokio::fs::try_exists(temp_path).await.unwrap_or(false) {
        if let Err(e) = tokio::fs::remove_file(temp_path).await {
            tracing::warn!("Could not remove {}: {}", temp_path.display(), e);
        }
    }
}

/// `<destination>.part`, keeping any extension the file already has
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(files::PARTIAL_FILE_SUFFIX);
    PathBuf::from(name)
}
