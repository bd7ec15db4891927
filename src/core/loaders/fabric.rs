use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::context::InstallContext;
use super::installer::LoaderInstaller;
use super::vanilla::VanillaInstaller;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::VersionJson;

const FABRIC_META_BASE: &str = "https://meta.fabricmc.net/v2";

#[derive(Debug, Deserialize)]
struct FabricLoaderEntry {
    loader: FabricLoaderVersion,
}

#[derive(Debug, Deserialize)]
struct FabricLoaderVersion {
    version: String,
    #[serde(default)]
    stable: bool,
}

/// Version id the launcher expects for a Fabric install.
pub fn fabric_version_id(minecraft_version: &str, loader_version: &str) -> String {
    format!("{}-fabric-{}", minecraft_version, loader_version)
}

/// Loader builds compatible with `minecraft_version`, newest first.
/// Returns `(version, stable)` pairs; empty when the game version is unsupported.
pub async fn list_loader_versions(
    client: &reqwest::Client,
    minecraft_version: &str,
) -> LauncherResult<Vec<(String, bool)>> {
    let url = format!("{}/versions/loader/{}", FABRIC_META_BASE, minecraft_version);
    let resp = client.get(&url).send().await?;
    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(Vec::new());
    }
    if !resp.status().is_success() {
        return Err(LauncherError::LoaderApi(format!(
            "Fabric Meta returned {} for {}",
            resp.status(),
            url
        )));
    }

    let entries: Vec<FabricLoaderEntry> = resp.json().await?;
    Ok(entries
        .into_iter()
        .map(|entry| (entry.loader.version, entry.loader.stable))
        .collect())
}

/// First stable build, falling back to the newest one.
pub fn pick_latest(builds: &[(String, bool)]) -> Option<String> {
    builds
        .iter()
        .find(|(_, stable)| *stable)
        .or_else(|| builds.first())
        .map(|(version, _)| version.clone())
}

pub struct FabricInstaller {
    client: reqwest::Client,
}

impl FabricInstaller {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch_profile(
        &self,
        minecraft_version: &str,
        loader_version: &str,
    ) -> LauncherResult<serde_json::Value> {
        let url = format!(
            "{}/versions/loader/{}/{}/profile/json",
            FABRIC_META_BASE, minecraft_version, loader_version
        );

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(LauncherError::LoaderApi(format!(
                "Fabric Meta returned {} for {}",
                resp.status(),
                url
            )));
        }

        Ok(resp.json().await?)
    }
}

/// Rename a Fabric Meta profile to the launcher's id convention.
fn rename_profile(mut profile: serde_json::Value, id: &str) -> LauncherResult<serde_json::Value> {
    let obj = profile
        .as_object_mut()
        .ok_or_else(|| LauncherError::LoaderApi("Fabric profile is not an object".into()))?;
    if obj.get("mainClass").and_then(|v| v.as_str()).unwrap_or("").is_empty() {
        return Err(LauncherError::LoaderApi(
            "Fabric profile missing mainClass".into(),
        ));
    }
    obj.insert("id".into(), serde_json::Value::String(id.to_string()));
    Ok(profile)
}

#[async_trait]
impl LoaderInstaller for FabricInstaller {
    async fn install(&self, ctx: &InstallContext<'_>) -> LauncherResult<String> {
        // Fabric profiles inherit from the vanilla version
        VanillaInstaller::new(self.client.clone()).install(ctx).await?;

        ctx.progress.status(&format!(
            "Installing Fabric {} for Minecraft {}",
            ctx.loader_version, ctx.minecraft_version
        ));

        let id = fabric_version_id(ctx.minecraft_version, ctx.loader_version);
        let profile = self
            .fetch_profile(ctx.minecraft_version, ctx.loader_version)
            .await?;
        let profile = rename_profile(profile, &id)?;

        let version_json: VersionJson = serde_json::from_value(profile.clone())?;
        let raw = serde_json::to_string_pretty(&profile)?;
        VersionJson::save_to(&raw, ctx.root_dir, &id).await?;

        let missing = version_json.missing_libraries(ctx.libs_dir)?;
        ctx.progress.status("Downloading Fabric libraries");
        ctx.progress.set_max(missing.len() as u64);
        let counter = ctx.progress.counter();
        let failed = ctx.downloader.download_batch(missing, || counter.tick()).await;
        if let Some((entry, err)) = failed.first() {
            return Err(LauncherError::Loader(format!(
                "{} Fabric library downloads failed (first: {}: {})",
                failed.len(),
                entry.url,
                err
            )));
        }

        info!("Fabric installed as {}", id);
        Ok(id)
    }
}
