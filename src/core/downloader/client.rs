use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::error::{LauncherError, LauncherResult};

/// A single file to download with optional SHA-1 for validation.
#[derive(Debug, Clone)]
pub struct DownloadEntry {
    pub url: String,
    pub dest: PathBuf,
    pub sha1: Option<String>,
}

/// Concurrent, SHA-1 validated downloader.
///
/// Every file is streamed into a sibling temp file and renamed into place, so
/// a partially written file is never observed under its final name.
pub struct Downloader {
    client: Client,
    /// Maximum number of parallel downloads.
    concurrency: usize,
    /// Per-request timeout for streamed bodies.
    timeout: Duration,
}

impl Downloader {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self {
            client,
            concurrency: 8,
            timeout,
        }
    }

    // ── Single file download ────────────────────────────

    /// Download a single file to `dest`, optionally validating SHA-1.
    ///
    /// Creates parent directories as needed.
    pub async fn download_file(
        &self,
        url: &str,
        dest: &Path,
        sha1_expected: Option<&str>,
    ) -> LauncherResult<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }

        let response = self.client.get(url).timeout(self.timeout).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let tmp = temp_path_for(dest);
        let mut hasher = Sha1::new();
        let written = async {
            let mut file = tokio::fs::File::create(&tmp)
                .await
                .map_err(|e| LauncherError::io(&tmp, e))?;
            let mut body = response.bytes_stream();
            while let Some(chunk) = body.next().await {
                let chunk = chunk?;
                hasher.update(&chunk);
                file.write_all(&chunk)
                    .await
                    .map_err(|e| LauncherError::io(&tmp, e))?;
            }
            file.flush().await.map_err(|e| LauncherError::io(&tmp, e))
            // file is dropped here, before the rename
        }
        .await;

        if let Err(e) = written {
            discard(&tmp).await;
            return Err(e);
        }

        if let Some(expected) = sha1_expected {
            let actual = hex::encode(hasher.finalize());
            if !actual.eq_ignore_ascii_case(expected) {
                discard(&tmp).await;
                return Err(LauncherError::Sha1Mismatch {
                    path: dest.to_path_buf(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        tokio::fs::rename(&tmp, dest)
            .await
            .map_err(|e| LauncherError::io(dest, e))?;

        debug!("Downloaded: {} -> {:?}", url, dest);
        Ok(())
    }

    // ── Batch concurrent downloads ──────────────────────

    /// Download many files concurrently using `buffer_unordered`, calling
    /// `on_complete` after each finished file.
    ///
    /// Returns the list of files that failed (if any).
    pub async fn download_batch<F>(
        &self,
        entries: Vec<DownloadEntry>,
        on_complete: F,
    ) -> Vec<(DownloadEntry, LauncherError)>
    where
        F: Fn() + Sync,
    {
        info!(
            "Starting batch download: {} files, concurrency={}",
            entries.len(),
            self.concurrency
        );

        let on_complete = &on_complete;
        let results: Vec<_> = stream::iter(entries)
            .map(|entry| async move {
                let result = self
                    .download_file(&entry.url, &entry.dest, entry.sha1.as_deref())
                    .await;
                on_complete();
                (entry, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        results
            .into_iter()
            .filter_map(|(entry, result)| result.err().map(|e| (entry, e)))
            .collect()
    }
}

/// Unique temp file next to `dest`, on the same filesystem for the rename.
pub fn temp_path_for(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}.{}.part", name, Uuid::new_v4().simple()))
}

/// Move a finished temp file into place unless `dest` appeared meanwhile.
///
/// Returns `false` when another writer got there first; the temp file is
/// removed in that case.
pub async fn finalize_download(tmp: &Path, dest: &Path) -> LauncherResult<bool> {
    if tokio::fs::try_exists(dest).await.unwrap_or(false) {
        discard(tmp).await;
        return Ok(false);
    }
    tokio::fs::rename(tmp, dest)
        .await
        .map_err(|e| LauncherError::io(dest, e))?;
    Ok(true)
}

pub async fn discard(tmp: &Path) {
    if let Err(e) = tokio::fs::remove_file(tmp).await {
        debug!("Could not remove temp file {:?}: {}", tmp, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_is_hidden_sibling() {
        let tmp = temp_path_for(Path::new("/games/mods/jei.jar"));
        assert_eq!(tmp.parent(), Some(Path::new("/games/mods")));
        let name = tmp.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with(".jei.jar."));
        assert!(name.ends_with(".part"));
        assert_ne!(tmp, temp_path_for(Path::new("/games/mods/jei.jar")));
    }

    #[tokio::test]
    async fn finalize_moves_temp_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a.jar");
        let tmp = temp_path_for(&dest);
        tokio::fs::write(&tmp, b"new").await.unwrap();

        assert!(finalize_download(&tmp, &dest).await.unwrap());
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"new");
        assert!(!tmp.exists());
    }

    #[tokio::test]
    async fn finalize_keeps_file_that_appeared_first() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a.jar");
        tokio::fs::write(&dest, b"first").await.unwrap();
        let tmp = temp_path_for(&dest);
        tokio::fs::write(&tmp, b"second").await.unwrap();

        assert!(!finalize_download(&tmp, &dest).await.unwrap());
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"first");
        assert!(!tmp.exists());
    }
}
