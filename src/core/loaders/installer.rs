use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::core::downloader::Downloader;
use crate::core::error::LauncherResult;
use crate::core::instance::LoaderType;

use super::{
    context::InstallContext, fabric::FabricInstaller, forge::ForgeInstaller,
    vanilla::VanillaInstaller,
};

// ─── Progress ───

/// Receives install progress. The default sink writes to the log.
pub trait ProgressSink: Send + Sync {
    fn status(&self, text: &str);
    fn progress(&self, current: u64, max: u64);
}

pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn status(&self, text: &str) {
        info!("{}", text);
    }

    fn progress(&self, current: u64, max: u64) {
        info!("{}/{}", current, max);
    }
}

/// Status / max / progress callbacks handed to installers.
///
/// The max is an atomic so installers may report from concurrent download
/// tasks; progress is dropped until a non-zero max has been set.
pub struct InstallProgress {
    max: AtomicU64,
    sink: Arc<dyn ProgressSink>,
}

impl InstallProgress {
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            max: AtomicU64::new(0),
            sink,
        }
    }

    pub fn status(&self, text: &str) {
        self.sink.status(text);
    }

    pub fn set_max(&self, total: u64) {
        self.max.store(total, Ordering::SeqCst);
    }

    pub fn progress(&self, current: u64) {
        let max = self.max.load(Ordering::SeqCst);
        if max != 0 {
            self.sink.progress(current, max);
        }
    }

    /// Counter that reports `1, 2, ..` against the current max, one step per
    /// finished file.
    pub fn counter(&self) -> ProgressCounter<'_> {
        ProgressCounter {
            progress: self,
            done: AtomicU64::new(0),
        }
    }
}

pub struct ProgressCounter<'a> {
    progress: &'a InstallProgress,
    done: AtomicU64,
}

impl ProgressCounter<'_> {
    pub fn tick(&self) {
        self.progress
            .progress(self.done.fetch_add(1, Ordering::SeqCst) + 1);
    }
}

// ─── Installer seam ───

/// What to install and where. `root_dir` and `runtime_exec` are already
/// expanded.
#[derive(Debug, Clone, Copy)]
pub struct InstallRequest<'a> {
    pub loader: LoaderType,
    pub base_version: &'a str,
    /// Ignored for vanilla.
    pub loader_version: &'a str,
    pub root_dir: &'a Path,
    pub runtime_exec: &'a Path,
}

/// Installs a base version plus optional loader into a game directory.
#[async_trait]
pub trait RuntimeInstaller: Send + Sync {
    /// Returns the installed version id.
    async fn install(
        &self,
        request: InstallRequest<'_>,
        progress: &InstallProgress,
    ) -> LauncherResult<String>;
}

/// A single loader's install routine.
#[async_trait]
pub trait LoaderInstaller: Send + Sync {
    async fn install(&self, ctx: &InstallContext<'_>) -> LauncherResult<String>;
}

/// Dispatches to the installer for the requested loader.
pub struct Installer {
    client: reqwest::Client,
    downloader: Downloader,
}

impl Installer {
    pub fn new(client: reqwest::Client, download_timeout: Duration) -> Self {
        let downloader = Downloader::new(client.clone(), download_timeout);
        Self { client, downloader }
    }
}

#[async_trait]
impl RuntimeInstaller for Installer {
    async fn install(
        &self,
        request: InstallRequest<'_>,
        progress: &InstallProgress,
    ) -> LauncherResult<String> {
        let libs_dir = request.root_dir.join("libraries");
        let ctx = InstallContext {
            minecraft_version: request.base_version,
            loader_version: request.loader_version,
            root_dir: request.root_dir,
            libs_dir: &libs_dir,
            runtime_exec: request.runtime_exec,
            downloader: &self.downloader,
            http_client: &self.client,
            progress,
        };

        match request.loader {
            LoaderType::Vanilla => VanillaInstaller::new(self.client.clone()).install(&ctx).await,
            LoaderType::Fabric => FabricInstaller::new(self.client.clone()).install(&ctx).await,
            LoaderType::Forge => ForgeInstaller::new(self.client.clone()).install(&ctx).await,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::RecordingSink;
    use super::*;
    use crate::core::downloader::DownloadEntry;

    #[test]
    fn progress_is_silent_until_max_is_set() {
        let sink = Arc::new(RecordingSink::default());
        let progress = InstallProgress::new(sink.clone());

        progress.progress(3);
        progress.status("Downloading libraries");
        progress.set_max(10);
        progress.progress(4);

        assert_eq!(
            *sink.events.lock().unwrap(),
            vec!["status:Downloading libraries".to_string(), "4/10".to_string()]
        );
    }

    #[test]
    fn counter_reports_each_finished_file() {
        let sink = Arc::new(RecordingSink::default());
        let progress = InstallProgress::new(sink.clone());
        progress.set_max(3);

        let counter = progress.counter();
        counter.tick();
        counter.tick();

        assert_eq!(*sink.events.lock().unwrap(), vec!["1/3", "2/3"]);
    }

    #[tokio::test]
    async fn batch_downloads_tick_even_when_files_fail() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let progress = InstallProgress::new(sink.clone());
        let downloader = Downloader::new(reqwest::Client::new(), Duration::from_secs(5));
        let entries: Vec<_> = ["a.jar", "b.jar"]
            .iter()
            .map(|name| DownloadEntry {
                url: "not a url".into(),
                dest: dir.path().join(name),
                sha1: None,
            })
            .collect();

        progress.set_max(entries.len() as u64);
        let counter = progress.counter();
        let failed = downloader.download_batch(entries, || counter.tick()).await;

        assert_eq!(failed.len(), 2);
        let mut events = sink.events.lock().unwrap().clone();
        events.sort();
        assert_eq!(events, vec!["1/2", "2/2"]);
    }

    #[test]
    fn progress_from_many_threads_sees_the_shared_max() {
        let sink = Arc::new(RecordingSink::default());
        let progress = Arc::new(InstallProgress::new(sink.clone()));
        progress.set_max(8);

        let handles: Vec<_> = (1..=8)
            .map(|i| {
                let progress = progress.clone();
                std::thread::spawn(move || progress.progress(i))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 8);
        assert!(events.iter().all(|e| e.ends_with("/8")));
    }
}
