use async_trait::async_trait;
use tracing::{info, warn};

use crate::core::assets::AssetManager;
use crate::core::downloader::DownloadEntry;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::{VersionJson, VersionManifest};

use super::context::InstallContext;
use super::installer::LoaderInstaller;

/// Vanilla installer: resolves the official version JSON, downloads the
/// client jar, libraries (OS rules applied) and assets.
pub struct VanillaInstaller {
    client: reqwest::Client,
}

impl VanillaInstaller {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LoaderInstaller for VanillaInstaller {
    async fn install(&self, ctx: &InstallContext<'_>) -> LauncherResult<String> {
        let progress = ctx.progress;
        progress.status(&format!("Installing Minecraft {}", ctx.minecraft_version));

        // 1. Fetch version manifest and find the entry
        let manifest = VersionManifest::fetch(&self.client).await?;
        let entry = manifest
            .find_version(ctx.minecraft_version)
            .ok_or_else(|| {
                LauncherError::Other(format!(
                    "Minecraft version {} not found in manifest",
                    ctx.minecraft_version
                ))
            })?;

        // 2. Fetch and save version JSON
        progress.status("Downloading version metadata");
        let (version_json, raw_json) = VersionJson::fetch(&self.client, &entry.url).await?;
        VersionJson::save_to(&raw_json, ctx.root_dir, &version_json.id).await?;

        // 3. Client jar
        progress.status("Downloading client jar");
        version_json
            .download_client(ctx.root_dir, ctx.downloader)
            .await?;

        // 4. Libraries and assets share one progress bar
        let libraries = version_json.missing_libraries(ctx.libs_dir)?;
        let assets = match &version_json.asset_index {
            Some(index) => {
                AssetManager::prepare(&self.client, index, &ctx.root_dir.join("assets")).await?
            }
            None => Vec::new(),
        };

        progress.set_max((libraries.len() + assets.len()) as u64);
        let counter = progress.counter();
        let tick = || counter.tick();

        progress.status("Downloading libraries");
        let failed = ctx.downloader.download_batch(libraries, tick).await;
        batch_result("library", &failed)?;

        progress.status("Downloading assets");
        let failed = ctx.downloader.download_batch(assets, tick).await;
        batch_result("asset", &failed)?;

        info!("Minecraft {} installed", version_json.id);
        Ok(version_json.id)
    }
}

/// Turns the failures of a download batch into an install error.
fn batch_result(kind: &str, failed: &[(DownloadEntry, LauncherError)]) -> LauncherResult<()> {
    let Some((entry, err)) = failed.first() else {
        return Ok(());
    };
    warn!("{} {} downloads failed", failed.len(), kind);
    Err(LauncherError::Loader(format!(
        "{} {} downloads failed (first: {}: {})",
        failed.len(),
        kind,
        entry.url,
        err
    )))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn failure(url: &str) -> (DownloadEntry, LauncherError) {
        (
            DownloadEntry {
                url: url.into(),
                dest: PathBuf::from("assets/objects/ab/abcd"),
                sha1: None,
            },
            LauncherError::DownloadFailed {
                url: url.into(),
                status: 404,
            },
        )
    }

    #[test]
    fn failed_assets_fail_the_install() {
        assert!(batch_result("asset", &[]).is_ok());

        let err = batch_result(
            "asset",
            &[failure("https://resources.example/ab/abcd"), failure("https://resources.example/cd/cdef")],
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("2 asset downloads failed"), "{message}");
        assert!(message.contains("https://resources.example/ab/abcd"), "{message}");
    }
}
