// ─── Version File ───
// Parses a Mojang-style version JSON, folds `inheritsFrom` chains and
// evaluates OS rules for libraries and arguments.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::core::downloader::{DownloadEntry, Downloader};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::maven::MavenArtifact;

/// Repository used for libraries that only carry a Maven coordinate.
const DEFAULT_LIBRARY_REPO: &str = "https://libraries.minecraft.net";

/// A fully parsed version JSON (vanilla or loader profile).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionJson {
    pub id: String,
    pub main_class: String,
    #[serde(default)]
    pub inherits_from: Option<String>,
    /// Version whose jar is put on the classpath (loader profiles).
    #[serde(default)]
    pub jar: Option<String>,
    #[serde(default, rename = "type")]
    pub version_type: Option<String>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    pub downloads: Option<VersionDownloads>,
    #[serde(default)]
    pub asset_index: Option<AssetIndexInfo>,
    #[serde(default)]
    pub assets: Option<String>,
    #[serde(default)]
    pub arguments: Option<Arguments>,
    /// Legacy `minecraftArguments` field (pre-1.13).
    #[serde(default)]
    pub minecraft_arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VersionDownloads {
    pub client: Option<DownloadArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadArtifact {
    pub sha1: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetIndexInfo {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<serde_json::Value>,
    #[serde(default)]
    pub jvm: Vec<serde_json::Value>,
}

// ─── Library Entry with Rules ───

#[derive(Debug, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    /// Maven repository base for coordinate-only libraries (Fabric style).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub rules: Option<Vec<LibraryRule>>,
}

#[derive(Debug, Deserialize)]
pub struct LibraryDownloads {
    pub artifact: Option<LibDownloadArtifact>,
}

#[derive(Debug, Deserialize)]
pub struct LibDownloadArtifact {
    pub path: String,
    #[serde(default)]
    pub sha1: Option<String>,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct LibraryRule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsRule>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Deserialize)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
}

impl LibraryEntry {
    /// Evaluate whether this library should be included for the current OS.
    ///
    /// No rules means allowed. Otherwise rules are processed top-to-bottom
    /// starting from "disallowed"; the last matching rule wins.
    pub fn is_allowed_for_current_os(&self) -> bool {
        let Some(rules) = &self.rules else {
            return true;
        };

        let current_os = current_os_name();
        let mut allowed = false;
        for rule in rules {
            let os_matches = match rule.os.as_ref().and_then(|os| os.name.as_deref()) {
                None => true,
                Some(name) => name == current_os,
            };
            if os_matches {
                allowed = rule.action == RuleAction::Allow;
            }
        }
        allowed
    }

    /// Path of this library relative to the libraries directory.
    pub fn relative_path(&self) -> LauncherResult<PathBuf> {
        if let Some(artifact) = self.downloads.as_ref().and_then(|d| d.artifact.as_ref()) {
            return Ok(PathBuf::from(&artifact.path));
        }
        Ok(MavenArtifact::parse(&self.name)?.local_path())
    }

    /// Download entry for this library, or `None` when it is already on disk.
    fn download_entry(&self, libs_dir: &Path) -> LauncherResult<Option<DownloadEntry>> {
        let dest = libs_dir.join(self.relative_path()?);
        if dest.exists() {
            return Ok(None);
        }

        let entry = match self.downloads.as_ref().and_then(|d| d.artifact.as_ref()) {
            Some(artifact) if !artifact.url.is_empty() => DownloadEntry {
                url: artifact.url.clone(),
                dest,
                sha1: artifact.sha1.clone(),
            },
            Some(_) => return Ok(None),
            None => {
                let repo = self.url.as_deref().unwrap_or(DEFAULT_LIBRARY_REPO);
                DownloadEntry {
                    url: MavenArtifact::parse(&self.name)?.url(repo),
                    dest,
                    sha1: None,
                }
            }
        };
        Ok(Some(entry))
    }
}

/// Get the Mojang OS name for the current platform.
pub fn current_os_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "osx"
    } else {
        "linux"
    }
}

/// `versions/<id>/<id>.json` under a game directory.
pub fn version_json_path(root: &Path, id: &str) -> PathBuf {
    root.join("versions").join(id).join(format!("{id}.json"))
}

/// `versions/<id>/<id>.jar` under a game directory.
pub fn version_jar_path(root: &Path, id: &str) -> PathBuf {
    root.join("versions").join(id).join(format!("{id}.jar"))
}

/// Ids of every version installed under `root`, sorted.
///
/// A version counts as installed when `versions/<id>/<id>.json` exists.
pub fn installed_versions(root: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(root.join("versions")) else {
        return Vec::new();
    };

    let mut ids: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|id| version_json_path(root, id).is_file())
        .collect();
    ids.sort();
    ids
}

impl VersionJson {
    /// Fetch and parse a version JSON from the given URL using a shared client.
    pub async fn fetch(client: &reqwest::Client, url: &str) -> LauncherResult<(Self, String)> {
        let raw = client.get(url).send().await?.error_for_status()?.text().await?;
        let version_json: VersionJson = serde_json::from_str(&raw)?;
        Ok((version_json, raw))
    }

    /// Save the raw version JSON as `versions/<id>/<id>.json`.
    pub async fn save_to(raw_json: &str, root: &Path, version_id: &str) -> LauncherResult<()> {
        let path = version_json_path(root, version_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }
        tokio::fs::write(&path, raw_json)
            .await
            .map_err(|e| LauncherError::io(&path, e))
    }

    /// Load `id` from disk with its whole `inheritsFrom` chain folded in.
    pub fn load_merged(root: &Path, id: &str) -> LauncherResult<Self> {
        let merged = load_merged_value(root, id, 0)?;
        Ok(serde_json::from_value(merged)?)
    }

    /// Download the client jar to `versions/<id>/<id>.jar`.
    pub async fn download_client(&self, root: &Path, downloader: &Downloader) -> LauncherResult<()> {
        if let Some(client_dl) = self.downloads.as_ref().and_then(|d| d.client.as_ref()) {
            let client_jar_path = version_jar_path(root, &self.id);
            if client_jar_path.exists() {
                debug!("Client jar for {} already present", self.id);
                return Ok(());
            }
            downloader
                .download_file(&client_dl.url, &client_jar_path, Some(&client_dl.sha1))
                .await?;
            info!("Downloaded client jar for {}", self.id);
        }
        Ok(())
    }

    /// Libraries allowed on the current OS, in declaration order.
    pub fn allowed_libraries(&self) -> impl Iterator<Item = &LibraryEntry> {
        self.libraries.iter().filter(|lib| {
            let allowed = lib.is_allowed_for_current_os();
            if !allowed {
                debug!("Skipping library (OS rule): {}", lib.name);
            }
            allowed
        })
    }

    /// Download entries for every allowed library missing from `libs_dir`.
    pub fn missing_libraries(&self, libs_dir: &Path) -> LauncherResult<Vec<DownloadEntry>> {
        let mut entries = Vec::new();
        for lib in self.allowed_libraries() {
            if let Some(entry) = lib.download_entry(libs_dir)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Id whose jar goes on the classpath.
    pub fn jar_id(&self) -> &str {
        self.jar
            .as_deref()
            .or(self.inherits_from.as_deref())
            .unwrap_or(&self.id)
    }

    /// Game arguments, string-only after rule evaluation.
    pub fn game_args(&self) -> Vec<String> {
        match &self.arguments {
            Some(args) if !args.game.is_empty() => {
                args.game.iter().flat_map(extract_argument_values).collect()
            }
            _ => match &self.minecraft_arguments {
                Some(s) => s.split_whitespace().map(str::to_string).collect(),
                None => vec![],
            },
        }
    }

    /// JVM arguments, string-only after rule evaluation. Legacy versions get
    /// the defaults the official launcher used before `arguments.jvm` existed.
    pub fn jvm_args(&self) -> Vec<String> {
        match &self.arguments {
            Some(args) if !args.jvm.is_empty() => {
                args.jvm.iter().flat_map(extract_argument_values).collect()
            }
            _ => vec![
                "-Djava.library.path=${natives_directory}".to_string(),
                "-cp".to_string(),
                "${classpath}".to_string(),
            ],
        }
    }
}

const MAX_INHERITANCE_DEPTH: usize = 8;

fn load_merged_value(root: &Path, id: &str, depth: usize) -> LauncherResult<serde_json::Value> {
    if depth > MAX_INHERITANCE_DEPTH {
        return Err(LauncherError::Other(format!(
            "inheritsFrom chain too deep at {id}"
        )));
    }

    let path = version_json_path(root, id);
    let raw = std::fs::read_to_string(&path).map_err(|e| LauncherError::io(&path, e))?;
    let current: serde_json::Value = serde_json::from_str(&raw)?;

    match current.get("inheritsFrom").and_then(|v| v.as_str()) {
        Some(parent_id) => {
            let parent = load_merged_value(root, parent_id, depth + 1)?;
            Ok(merge_with_parent_json(&current, &parent))
        }
        None => Ok(current),
    }
}

/// Merge a child version JSON over its parent: scalar keys are overridden,
/// `libraries` and `arguments.{game,jvm}` are concatenated child-first.
pub fn merge_with_parent_json(
    current_json: &serde_json::Value,
    parent_json: &serde_json::Value,
) -> serde_json::Value {
    let mut merged = parent_json.clone();

    let Some(obj) = current_json.as_object() else {
        return merged;
    };

    for (key, value) in obj {
        let inherited = merged.get(key).cloned();
        let combined = match (key.as_str(), value, inherited) {
            ("libraries", serde_json::Value::Array(child), Some(serde_json::Value::Array(parent))) => {
                let mut libs = child.clone();
                libs.extend(parent);
                serde_json::Value::Array(libs)
            }
            ("arguments", serde_json::Value::Object(child), Some(serde_json::Value::Object(parent))) => {
                let mut args = parent.clone();
                for (kind, child_list) in child {
                    let mut list = child_list.as_array().cloned().unwrap_or_default();
                    if let Some(parent_list) = parent.get(kind).and_then(|v| v.as_array()) {
                        list.extend(parent_list.iter().cloned());
                    }
                    args.insert(kind.clone(), serde_json::Value::Array(list));
                }
                serde_json::Value::Object(args)
            }
            _ => value.clone(),
        };
        merged[key] = combined;
    }

    merged
}

fn extract_argument_values(value: &serde_json::Value) -> Vec<String> {
    if let Some(arg) = value.as_str() {
        return vec![arg.to_string()];
    }

    let Some(obj) = value.as_object() else {
        return vec![];
    };

    if let Some(rules) = obj.get("rules").and_then(|r| r.as_array()) {
        if !rules_allow_current_os(rules) {
            return vec![];
        }
    }

    match obj.get("value") {
        Some(serde_json::Value::String(s)) => vec![s.clone()],
        Some(serde_json::Value::Array(arr)) => arr
            .iter()
            .filter_map(|v| v.as_str().map(ToString::to_string))
            .collect(),
        _ => vec![],
    }
}

/// Feature-gated rules (demo user, custom resolution, quick play) never match:
/// none of those features are enabled by this launcher.
fn rules_allow_current_os(rules: &[serde_json::Value]) -> bool {
    let mut allowed = false;
    let current_os = current_os_name();

    for rule in rules {
        let action = rule
            .get("action")
            .and_then(|v| v.as_str())
            .unwrap_or("disallow");

        if rule.get("features").is_some() {
            continue;
        }

        let os_matches = match rule
            .get("os")
            .and_then(|os| os.get("name"))
            .and_then(|name| name.as_str())
        {
            None => true,
            Some(name) => name == current_os,
        };

        if os_matches {
            allowed = action == "allow";
        }
    }

    allowed
}
