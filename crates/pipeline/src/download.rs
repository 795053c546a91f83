//! Entry download with retry and exponential backoff.
//!
//! Each attempt streams the entry into `{name}.partial` and only renames it
//! to `{name}` once the stream has ended, so a complete-looking file is
//! always a complete file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use archive::{Archive, ArchiveError, CandidateProduct};
use futures::StreamExt;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::error::{EntryError, EntryResult};
use crate::timestamp::base_name;

/// Configuration for the download manager.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial retry delay (doubles each retry)
    pub initial_retry_delay: Duration,
    /// Maximum retry delay
    pub max_retry_delay: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_retry_delay: Duration::from_secs(2),
            max_retry_delay: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
enum AttemptError {
    Archive(ArchiveError),
    Io(std::io::Error),
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Archive(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

/// Downloads archive entries into scratch directories.
#[derive(Clone)]
pub struct DownloadManager {
    archive: Arc<dyn Archive>,
    config: DownloadConfig,
}

impl DownloadManager {
    pub fn new(archive: Arc<dyn Archive>, config: DownloadConfig) -> Self {
        Self { archive, config }
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Download `entry` of `product` into `dest_dir/{basename}`.
    #[instrument(skip(self, product, dest_dir), fields(product = %product.product_id))]
    pub async fn download(&self, product: &CandidateProduct, entry: &str, dest_dir: &Path) -> EntryResult<PathBuf> {
        let filename = base_name(entry);
        let temp_path = dest_dir.join(format!("{}.partial", filename));
        let final_path = dest_dir.join(filename);

        let mut retry_count = 0;
        let mut delay = self.config.initial_retry_delay;

        loop {
            match self.attempt(product, entry, &temp_path).await {
                Ok(bytes) => {
                    if fs::rename(&temp_path, &final_path).await.is_err() {
                        fs::copy(&temp_path, &final_path).await.map_err(EntryError::Scratch)?;
                        fs::remove_file(&temp_path).await.map_err(EntryError::Scratch)?;
                    }

                    info!(path = %final_path.display(), bytes, "Download completed");
                    return Ok(final_path);
                }
                Err(e) => {
                    retry_count += 1;
                    fs::remove_file(&temp_path).await.ok();

                    if retry_count > self.config.max_retries {
                        return Err(EntryError::Download {
                            entry: entry.to_string(),
                            attempts: retry_count,
                            message: e.to_string(),
                        });
                    }

                    warn!(
                        error = %e,
                        retry = retry_count,
                        max_retries = self.config.max_retries,
                        delay_secs = delay.as_secs_f64(),
                        "Download failed, retrying"
                    );

                    tokio::time::sleep(delay).await;

                    // Exponential backoff
                    delay = std::cmp::min(delay * 2, self.config.max_retry_delay);
                }
            }
        }
    }

    async fn attempt(&self, product: &CandidateProduct, entry: &str, temp_path: &Path) -> Result<u64, AttemptError> {
        let mut stream = self
            .archive
            .open(product, entry)
            .await
            .map_err(AttemptError::Archive)?;
        let mut file = File::create(temp_path).await.map_err(AttemptError::Io)?;

        let mut bytes = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(AttemptError::Archive)?;
            file.write_all(&chunk).await.map_err(AttemptError::Io)?;
            bytes += chunk.len() as u64;
        }
        file.flush().await.map_err(AttemptError::Io)?;
        debug!(entry, bytes, "Entry stream finished");
        Ok(bytes)
    }
}
