//! Bulk download of a completed request's file list
//!
//! Files are fetched one at a time into the request directory. A file whose
//! local size already matches the manifest is skipped, so re-running a
//! download resumes where the previous run stopped.

use std::path::{Path, PathBuf};

use crate::app::client::{DownloadHandler, RetryPolicy, Transport};
use crate::app::models::{FileManifest, ManifestEntry};
use crate::errors::{DownloadError, DownloadResult};

/// Receives download progress as a completed fraction
///
/// Values run from `0.0` to `1.0`. A negative value means the run halted.
pub trait ProgressSink {
    fn update(&mut self, fraction: f64);
}

/// Counts for a finished download run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub total: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub bytes: u64,
}

/// Downloads every file of a manifest that is missing or has the wrong size
pub struct BulkDownloader<'a, T: Transport + ?Sized> {
    transport: &'a T,
    policy: RetryPolicy,
}

impl<'a, T: Transport + ?Sized> BulkDownloader<'a, T> {
    pub fn new(transport: &'a T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Fetch the manifest's files into `directory`
    ///
    /// Every entry's local name is checked before anything is fetched. The
    /// first file that fails all of its attempts stops the run; the progress
    /// sink then receives a halt.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::InvalidManifest` for an entry with no file
    /// name, `DownloadError::Io` if the directory cannot be created, and the
    /// per-file error of the first file that could not be fetched.
    pub async fn download_all(
        &self,
        manifest: &FileManifest,
        directory: &Path,
        progress: &mut dyn ProgressSink,
    ) -> DownloadResult<DownloadSummary> {
        let targets = plan_targets(manifest, directory)?;

        tokio::fs::create_dir_all(directory)
            .await
            .map_err(|source| DownloadError::Io {
                path: directory.to_path_buf(),
                source,
            })?;

        let total = targets.len();
        let mut summary = DownloadSummary {
            total,
            ..Default::default()
        };

        if total == 0 {
            tracing::info!("File list is empty, nothing to download");
            progress.update(1.0);
            return Ok(summary);
        }

        tracing::info!("Downloading {} files into {}", total, directory.display());
        progress.update(0.0);

        let handler = DownloadHandler::new(self.transport, self.policy);
        for (completed, (entry, path)) in targets.iter().enumerate() {
            if is_complete(path, entry.expected_size).await {
                tracing::debug!("Skipping {}, local size matches", path.display());
                summary.skipped += 1;
            } else {
                match handler.download_file(&entry.remote_path, path).await {
                    Ok(bytes) => {
                        summary.downloaded += 1;
                        summary.bytes += bytes;
                    }
                    Err(e) => {
                        progress.update(-1.0);
                        return Err(e);
                    }
                }
            }

            progress.update((completed + 1) as f64 / total as f64);
        }

        tracing::info!(
            "Download finished: {} fetched, {} skipped, {} bytes",
            summary.downloaded,
            summary.skipped,
            summary.bytes
        );
        Ok(summary)
    }
}

fn plan_targets<'m>(
    manifest: &'m FileManifest,
    directory: &Path,
) -> DownloadResult<Vec<(&'m ManifestEntry, PathBuf)>> {
    manifest
        .entries()
        .iter()
        .map(|entry| -> DownloadResult<_> { Ok((entry, directory.join(entry.file_name()?))) })
        .collect()
}

/// A local file counts as complete only when its size equals a known expected size
async fn is_complete(path: &Path, expected_size: Option<u64>) -> bool {
    let Some(expected) = expected_size else {
        return false;
    };
    match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.is_file() && metadata.len() == expected,
        Err(_) => false,
    }
}
