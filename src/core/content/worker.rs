// ─── Content Download Worker ───
// Splits a manifest into contiguous shards and drains them with a bounded
// pool of tasks. Items already present in the content directory are skipped.

use std::collections::VecDeque;
use std::ops::{AddAssign, Range};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use percent_encoding::percent_decode_str;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::core::downloader::{discard, finalize_download, temp_path_for};
use crate::core::error::{LauncherError, LauncherResult};

use super::manifest::ContentManifestEntry;
use super::registry::ContentSource;

pub const DEFAULT_WORKERS: usize = 10;

/// Contiguous shards of at most `ceil(len / workers)` items. A worker count
/// of zero is treated as one.
pub fn plan_shards(len: usize, workers: usize) -> Vec<Range<usize>> {
    if len == 0 {
        return Vec::new();
    }
    let size = len.div_ceil(workers.max(1));
    (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect()
}

/// Outcome counts for one content install.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentInstallReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ContentInstallReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn total(&self) -> usize {
        self.downloaded + self.skipped + self.failed
    }

    fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Downloaded => self.downloaded += 1,
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Failed => self.failed += 1,
        }
    }
}

impl AddAssign for ContentInstallReport {
    fn add_assign(&mut self, other: Self) {
        self.downloaded += other.downloaded;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

impl std::fmt::Display for ContentInstallReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} downloaded, {} already present, {} failed",
            self.downloaded, self.skipped, self.failed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Downloaded,
    Skipped,
    Failed,
}

struct Shard {
    index: usize,
    entries: Vec<ContentManifestEntry>,
}

/// Installs manifest entries into one content directory.
#[derive(Clone)]
pub struct ContentDownloadWorker {
    source: Arc<dyn ContentSource>,
    content_dir: PathBuf,
}

impl ContentDownloadWorker {
    pub fn new(source: Arc<dyn ContentSource>, content_dir: PathBuf) -> Self {
        Self {
            source,
            content_dir,
        }
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    /// Install every entry and wait for all of them. Per-item failures are
    /// counted, never propagated.
    pub async fn install_all(
        &self,
        entries: &[ContentManifestEntry],
        workers: usize,
    ) -> ContentInstallReport {
        let total_items = entries.len();
        let plan = plan_shards(total_items, workers);
        let shard_count = plan.len();
        if shard_count == 0 {
            info!("Content manifest is empty, nothing to install");
            return ContentInstallReport::default();
        }

        let queue: VecDeque<Shard> = plan
            .into_iter()
            .enumerate()
            .map(|(index, range)| Shard {
                index,
                entries: entries[range].to_vec(),
            })
            .collect();
        let queue = Arc::new(Mutex::new(queue));

        let pool_size = workers.max(1).min(shard_count);
        info!(
            "Installing {} content items in {} shards with {} workers",
            total_items, shard_count, pool_size
        );

        let mut tasks = JoinSet::new();
        for _ in 0..pool_size {
            let worker = self.clone();
            let queue = Arc::clone(&queue);
            tasks.spawn(async move {
                let mut report = ContentInstallReport::default();
                while let Some(shard) = next_shard(&queue) {
                    report += worker.install_shard(shard, shard_count, total_items).await;
                }
                report
            });
        }

        let mut report = ContentInstallReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(partial) => report += partial,
                Err(e) => {
                    error!("Content worker crashed: {}", e);
                    report.failed += 1;
                }
            }
        }

        // Items a crashed worker never reached still count against success
        let accounted = report.total();
        if accounted < total_items {
            report.failed += total_items - accounted;
        }

        info!("Content install finished: {}", report);
        report
    }

    async fn install_shard(
        &self,
        shard: Shard,
        shard_count: usize,
        total_items: usize,
    ) -> ContentInstallReport {
        let mut report = ContentInstallReport::default();
        let shard_len = shard.entries.len();
        for (i, entry) in shard.entries.iter().enumerate() {
            let label = format!(
                "[shard {}/{}] [item {}/{} of {}] {}",
                shard.index + 1,
                shard_count,
                i + 1,
                shard_len,
                total_items,
                entry
            );
            report.record(self.install_item(entry, &label).await);
        }
        report
    }

    /// Resolve, download and place a single entry.
    pub async fn install_item(&self, entry: &ContentManifestEntry, label: &str) -> ItemOutcome {
        let url = match self.source.resolve_download_url(entry).await {
            Ok(url) => url,
            Err(e) => {
                warn!("{} download URL unavailable, skipping: {}", label, e);
                return ItemOutcome::Failed;
            }
        };

        let Some(file_name) = file_name_from_url(&url) else {
            warn!("{} cannot derive a file name from {}", label, url);
            return ItemOutcome::Failed;
        };

        let dest = self.content_dir.join(&file_name);
        if dest.exists() {
            info!("{} {} already exists, skipping", label, file_name);
            return ItemOutcome::Skipped;
        }

        match self.download_to(&url, &dest).await {
            Ok(true) => {
                info!("{} installed {}", label, file_name);
                ItemOutcome::Downloaded
            }
            Ok(false) => {
                info!("{} {} appeared while downloading, keeping existing file", label, file_name);
                ItemOutcome::Skipped
            }
            Err(e) => {
                warn!("{} failed to download {}: {}", label, url, e);
                ItemOutcome::Failed
            }
        }
    }

    async fn download_to(&self, url: &str, dest: &Path) -> LauncherResult<bool> {
        tokio::fs::create_dir_all(&self.content_dir)
            .await
            .map_err(|e| LauncherError::io(&self.content_dir, e))?;

        let tmp = temp_path_for(dest);
        if let Err(e) = self.source.download(url, &tmp).await {
            discard(&tmp).await;
            return Err(e);
        }
        finalize_download(&tmp, dest).await
    }
}

fn next_shard(queue: &Mutex<VecDeque<Shard>>) -> Option<Shard> {
    queue.lock().ok()?.pop_front()
}

/// Last path segment of `url`, percent-decoded, rejecting anything that is
/// not a plain name.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let raw = parsed.path_segments()?.next_back()?;
    let name = percent_decode_str(raw).decode_utf8().ok()?;
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return None;
    }
    Some(name.into_owned())
}
