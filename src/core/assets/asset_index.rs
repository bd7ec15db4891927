use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::core::downloader::DownloadEntry;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::AssetIndexInfo;

const RESOURCES_URL: &str = "https://resources.download.minecraft.net";

/// Manages Minecraft asset downloads (sounds, textures referenced by asset index).
pub struct AssetManager;

/// Top-level asset index JSON structure.
#[derive(Debug, Deserialize)]
pub struct AssetIndex {
    pub objects: HashMap<String, AssetObject>,
}

#[derive(Debug, Deserialize)]
pub struct AssetObject {
    pub hash: String,
}

impl AssetManager {
    /// Fetch and store `assets/indexes/<id>.json`, returning download entries
    /// for every object not yet present under `assets/objects/`.
    pub async fn prepare(
        client: &reqwest::Client,
        index_info: &AssetIndexInfo,
        assets_dir: &Path,
    ) -> LauncherResult<Vec<DownloadEntry>> {
        let index_resp = client.get(&index_info.url).send().await?;
        if !index_resp.status().is_success() {
            return Err(LauncherError::DownloadFailed {
                url: index_info.url.clone(),
                status: index_resp.status().as_u16(),
            });
        }
        let index_text = index_resp.text().await?;
        let index: AssetIndex = serde_json::from_str(&index_text)?;

        let indexes_dir = assets_dir.join("indexes");
        tokio::fs::create_dir_all(&indexes_dir)
            .await
            .map_err(|e| LauncherError::io(&indexes_dir, e))?;
        let index_path = indexes_dir.join(format!("{}.json", index_info.id));
        tokio::fs::write(&index_path, &index_text)
            .await
            .map_err(|e| LauncherError::io(&index_path, e))?;

        let entries = missing_objects(&index, &assets_dir.join("objects"));
        info!(
            "Asset index {}: {} objects to download ({} already cached)",
            index_info.id,
            entries.len(),
            index.objects.len() - entries.len()
        );
        Ok(entries)
    }
}

fn missing_objects(index: &AssetIndex, objects_dir: &Path) -> Vec<DownloadEntry> {
    let mut entries: Vec<DownloadEntry> = index
        .objects
        .values()
        .filter(|obj| obj.hash.len() > 2)
        .filter_map(|obj| {
            let hash_prefix = &obj.hash[..2];
            let dest = objects_dir.join(hash_prefix).join(&obj.hash);
            if dest.exists() {
                return None;
            }
            Some(DownloadEntry {
                url: format!("{}/{}/{}", RESOURCES_URL, hash_prefix, obj.hash),
                dest,
                sha1: Some(obj.hash.clone()),
            })
        })
        .collect();
    // Several names may share one object.
    entries.sort_by(|a, b| a.dest.cmp(&b.dest));
    entries.dedup_by(|a, b| a.dest == b.dest);
    entries
}
