use std::path::Path;

use crate::core::downloader::Downloader;

use super::installer::InstallProgress;

/// Everything an individual loader installer needs.
pub struct InstallContext<'a> {
    pub minecraft_version: &'a str,
    pub loader_version: &'a str,
    /// Expanded game directory (`versions/`, `libraries/`, `assets/` live here).
    pub root_dir: &'a Path,
    pub libs_dir: &'a Path,
    /// Java executable, used by installers that run a jar.
    pub runtime_exec: &'a Path,
    pub downloader: &'a Downloader,
    pub http_client: &'a reqwest::Client,
    pub progress: &'a InstallProgress,
}
