// ─── Version Manifest ───
// Handles fetching and parsing the Mojang version manifest v2.

use serde::Deserialize;
use tracing::info;

use crate::core::error::LauncherResult;

pub const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

/// Top-level Mojang version manifest.
#[derive(Debug, Deserialize)]
pub struct VersionManifest {
    pub latest: LatestVersions,
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Deserialize)]
pub struct LatestVersions {
    pub release: String,
    pub snapshot: String,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

impl VersionManifest {
    pub async fn fetch(client: &reqwest::Client) -> LauncherResult<Self> {
        info!("Fetching Minecraft version manifest...");

        let manifest: VersionManifest = client
            .get(VERSION_MANIFEST_URL)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }

    pub fn latest_release(&self) -> &str {
        &self.latest.release
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "latest": {"release": "1.20.4", "snapshot": "24w03a"},
        "versions": [
            {"id": "24w03a", "type": "snapshot", "url": "https://example.com/24w03a.json",
             "time": "2024-01-17T12:00:00+00:00", "releaseTime": "2024-01-17T12:00:00+00:00"},
            {"id": "1.20.4", "type": "release", "url": "https://example.com/1.20.4.json",
             "sha1": "abc123", "releaseTime": "2023-12-07T08:00:00+00:00"}
        ]
    }"#;

    #[test]
    fn parses_latest_and_entries() {
        let manifest: VersionManifest = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(manifest.latest_release(), "1.20.4");
        assert_eq!(manifest.latest.snapshot, "24w03a");

        let entry = manifest.find_version("1.20.4").unwrap();
        assert_eq!(entry.version_type, "release");
        assert_eq!(entry.sha1.as_deref(), Some("abc123"));
        assert!(manifest.find_version("1.20.4-forge").is_none());
    }
}
