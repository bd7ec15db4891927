use std::cmp::Ordering;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::context::InstallContext;
use super::installer::LoaderInstaller;
use super::vanilla::VanillaInstaller;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::maven::FORGE_MAVEN;
use crate::core::version::version_json_path;

const FORGE_METADATA_URL: &str =
    "https://maven.minecraftforge.net/net/minecraftforge/forge/maven-metadata.xml";

#[derive(Debug, Deserialize)]
struct MavenMetadata {
    versioning: MavenVersioning,
}

#[derive(Debug, Deserialize)]
struct MavenVersioning {
    versions: MavenVersions,
}

#[derive(Debug, Deserialize)]
struct MavenVersions {
    #[serde(rename = "version", default)]
    version: Vec<String>,
}

/// Forge versions are stored in their full `<mc>-<forge>` form; a bare
/// `47.2.0` is prefixed with the base version.
pub fn qualify_forge_version(minecraft_version: &str, forge_version: &str) -> String {
    let prefix = format!("{}-", minecraft_version);
    if forge_version.starts_with(&prefix) {
        forge_version.to_string()
    } else {
        format!("{}{}", prefix, forge_version)
    }
}

/// Name the Forge installer gives the version it installs:
/// `1.20.1-47.2.0` becomes `1.20.1-forge-47.2.0`.
pub fn forge_installed_version(minecraft_version: &str, forge_version: &str) -> String {
    let qualified = qualify_forge_version(minecraft_version, forge_version);
    let build = &qualified[minecraft_version.len() + 1..];
    format!("{}-forge-{}", minecraft_version, build)
}

fn version_sort_key(version: &str) -> Vec<u64> {
    version
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<u64>().unwrap_or(0))
        .collect()
}

fn compare_versions(a: &str, b: &str) -> Ordering {
    version_sort_key(a)
        .cmp(&version_sort_key(b))
        .then_with(|| a.cmp(b))
}

fn parse_metadata(xml: &str) -> LauncherResult<Vec<String>> {
    let metadata: MavenMetadata = quick_xml::de::from_str(xml)
        .map_err(|e| LauncherError::LoaderApi(format!("Unable to parse Forge metadata: {e}")))?;
    Ok(metadata.versioning.versions.version)
}

/// Full Forge ids (`<mc>-<build>`) published for `minecraft_version`, newest first.
pub fn forge_versions_for(all: Vec<String>, minecraft_version: &str) -> Vec<String> {
    let prefix = format!("{}-", minecraft_version);
    let mut matching: Vec<String> = all
        .into_iter()
        .filter(|v| v.starts_with(&prefix))
        .collect();
    matching.sort_by(|a, b| compare_versions(b, a));
    matching
}

pub async fn list_forge_versions(
    client: &reqwest::Client,
    minecraft_version: &str,
) -> LauncherResult<Vec<String>> {
    let resp = client.get(FORGE_METADATA_URL).send().await?;
    if !resp.status().is_success() {
        return Err(LauncherError::LoaderApi(format!(
            "Forge Maven returned {}",
            resp.status()
        )));
    }
    let xml = resp.text().await?;
    Ok(forge_versions_for(parse_metadata(&xml)?, minecraft_version))
}

/// Installs Forge by downloading and executing the official installer jar.
pub struct ForgeInstaller {
    client: reqwest::Client,
}

impl ForgeInstaller {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LoaderInstaller for ForgeInstaller {
    async fn install(&self, ctx: &InstallContext<'_>) -> LauncherResult<String> {
        // The Forge installer expects the vanilla version in place
        VanillaInstaller::new(self.client.clone()).install(ctx).await?;

        let forge_id = qualify_forge_version(ctx.minecraft_version, ctx.loader_version);
        ctx.progress.status(&format!("Installing Forge {}", forge_id));

        let installer_name = format!("forge-{}-installer.jar", forge_id);
        let installer_url = format!(
            "{}/net/minecraftforge/forge/{}/{}",
            FORGE_MAVEN, forge_id, installer_name
        );
        let installer_path = ctx.root_dir.join("installers").join(&installer_name);
        if !installer_path.exists() {
            ctx.downloader
                .download_file(&installer_url, &installer_path, None)
                .await?;
        }

        let launcher_profiles_path = ctx.root_dir.join("launcher_profiles.json");
        if !launcher_profiles_path.exists() {
            tokio::fs::write(
                &launcher_profiles_path,
                br#"{"profiles":{},"selectedProfile":null}"#,
            )
            .await
            .map_err(|e| LauncherError::io(&launcher_profiles_path, e))?;
        }

        ctx.progress.status("Running Forge installer");
        let output = tokio::process::Command::new(ctx.runtime_exec)
            .arg("-jar")
            .arg(&installer_path)
            .arg("--installClient")
            .arg(ctx.root_dir)
            .current_dir(ctx.root_dir)
            .output()
            .await
            .map_err(|e| LauncherError::Execution(format!("{:?}: {}", ctx.runtime_exec, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(LauncherError::Loader(format!(
                "Forge installer failed (code {:?})\nSTDOUT:\n{}\nSTDERR:\n{}",
                output.status.code(),
                stdout,
                stderr
            )));
        }
        debug!("Forge installer output: {}", String::from_utf8_lossy(&output.stdout));

        let installed = forge_installed_version(ctx.minecraft_version, ctx.loader_version);
        if !version_json_path(ctx.root_dir, &installed).is_file() {
            return Err(LauncherError::Loader(format!(
                "Forge installer finished but {} is missing",
                installed
            )));
        }

        info!("Forge installed as {}", installed);
        Ok(installed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualify_is_idempotent() {
        assert_eq!(qualify_forge_version("1.20.1", "47.2.0"), "1.20.1-47.2.0");
        assert_eq!(qualify_forge_version("1.20.1", "1.20.1-47.2.0"), "1.20.1-47.2.0");
    }

    #[test]
    fn installed_alias_inserts_forge_marker() {
        assert_eq!(forge_installed_version("1.20.1", "1.20.1-47.2.0"), "1.20.1-forge-47.2.0");
        assert_eq!(forge_installed_version("1.12.2", "14.23.5.2859"), "1.12.2-forge-14.23.5.2859");
    }

    #[test]
    fn metadata_filtered_and_sorted_newest_first() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>net.minecraftforge</groupId>
  <artifactId>forge</artifactId>
  <versioning>
    <release>1.20.4-49.0.30</release>
    <versions>
      <version>1.20.1-47.1.0</version>
      <version>1.20.1-47.2.0</version>
      <version>1.20.1-47.10.1</version>
      <version>1.20.4-49.0.30</version>
      <version>1.20-46.0.14</version>
    </versions>
  </versioning>
</metadata>"#;
        let all = parse_metadata(xml).unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(
            forge_versions_for(all, "1.20.1"),
            vec!["1.20.1-47.10.1", "1.20.1-47.2.0", "1.20.1-47.1.0"]
        );
    }
}
