// ─── Version Catalog ───
// Online answers to "latest" / "is valid" for the base game and each loader.

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::core::error::LauncherResult;
use crate::core::instance::LoaderType;
use crate::core::loaders::{fabric, forge};

use super::manifest::VersionManifest;
use super::resolver::VersionSource;

/// Mojang manifest + Fabric Meta + Forge Maven metadata.
pub struct MetaVersionSource {
    client: reqwest::Client,
    manifest: OnceCell<VersionManifest>,
}

impl MetaVersionSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            manifest: OnceCell::new(),
        }
    }

    /// Fetched once per source.
    async fn manifest(&self) -> LauncherResult<&VersionManifest> {
        self.manifest
            .get_or_try_init(|| VersionManifest::fetch(&self.client))
            .await
    }
}

#[async_trait]
impl VersionSource for MetaVersionSource {
    async fn latest_release(&self) -> LauncherResult<String> {
        Ok(self.manifest().await?.latest_release().to_string())
    }

    async fn is_release(&self, version: &str) -> LauncherResult<bool> {
        Ok(self.manifest().await?.find_version(version).is_some())
    }

    async fn latest_loader(&self, loader: LoaderType, base: &str) -> LauncherResult<Option<String>> {
        match loader {
            LoaderType::Vanilla => Ok(None),
            LoaderType::Fabric => {
                let builds = fabric::list_loader_versions(&self.client, base).await?;
                Ok(fabric::pick_latest(&builds))
            }
            LoaderType::Forge => Ok(forge::list_forge_versions(&self.client, base)
                .await?
                .into_iter()
                .next()),
        }
    }

    async fn is_loader_valid(
        &self,
        loader: LoaderType,
        base: &str,
        loader_version: &str,
    ) -> LauncherResult<bool> {
        match loader {
            LoaderType::Vanilla => Ok(false),
            LoaderType::Fabric => Ok(fabric::list_loader_versions(&self.client, base)
                .await?
                .iter()
                .any(|(version, _)| version == loader_version)),
            LoaderType::Forge => {
                let wanted = forge::qualify_forge_version(base, loader_version);
                Ok(forge::list_forge_versions(&self.client, base)
                    .await?
                    .contains(&wanted))
            }
        }
    }
}
