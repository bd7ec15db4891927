use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::content::{ContentSource, CurseForgeSource, DEFAULT_WORKERS};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::build_http_client;
use crate::core::launch::{CommandSynthesizer, VersionJsonSynthesizer};
use crate::core::loaders::{Installer, LogProgressSink, ProgressSink, RuntimeInstaller};
use crate::core::network::{DnsProbe, FixedReachability, Reachability};
use crate::core::version::{MetaVersionSource, VersionSource};

const APP_DIR_NAME: &str = "Blocklaunch";
const SETTINGS_FILE: &str = "launcher_settings.json";

/// Persisted launcher-wide settings. Unknown or missing keys fall back to
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherSettings {
    pub registry_api_key: Option<String>,
    pub registry_base_url: String,
    pub content_workers: usize,
    pub request_timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub reachability_host: String,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            registry_api_key: None,
            registry_base_url: "https://api.curseforge.com".into(),
            content_workers: DEFAULT_WORKERS,
            request_timeout_secs: 60,
            download_timeout_secs: 180,
            reachability_host: "piston-meta.mojang.com".into(),
        }
    }
}

impl LauncherSettings {
    /// Settings from `path`; defaults when the file is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings at {:?}, using defaults", path);
                return Self::default();
            }
            Err(e) => {
                warn!("Could not read settings {:?}: {}; using defaults", path, e);
                return Self::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Settings file {:?} is corrupt ({}); using defaults", path, e);
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> LauncherResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| LauncherError::io(path, e))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

/// `<data dir>/Blocklaunch/launcher_settings.json`.
pub fn default_settings_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(SETTINGS_FILE)
}

/// Collaborators shared by every instance operation.
pub struct AppState {
    pub settings: LauncherSettings,
    pub reachability: Arc<dyn Reachability>,
    pub versions: Arc<dyn VersionSource>,
    pub installer: Arc<dyn RuntimeInstaller>,
    /// `None` without a registry API key.
    pub content: Option<Arc<dyn ContentSource>>,
    pub synthesizer: Arc<dyn CommandSynthesizer>,
    pub progress: Arc<dyn ProgressSink>,
}

impl AppState {
    /// Production wiring. `offline` pins reachability to "unreachable".
    pub fn new(settings: LauncherSettings, offline: bool) -> LauncherResult<Self> {
        let http_client = build_http_client(settings.request_timeout())?;

        let reachability: Arc<dyn Reachability> = if offline {
            Arc::new(FixedReachability(false))
        } else {
            Arc::new(DnsProbe::new(settings.reachability_host.clone()))
        };

        let content = settings
            .registry_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .map(|key| {
                Arc::new(CurseForgeSource::new(
                    http_client.clone(),
                    &settings.registry_base_url,
                    key,
                    settings.download_timeout(),
                )) as Arc<dyn ContentSource>
            });

        Ok(Self {
            reachability,
            versions: Arc::new(MetaVersionSource::new(http_client.clone())),
            installer: Arc::new(Installer::new(http_client, settings.download_timeout())),
            content,
            synthesizer: Arc::new(VersionJsonSynthesizer),
            progress: Arc::new(LogProgressSink),
            settings,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::launch::builder::test_support::FakeSynthesizer;
    use crate::core::loaders::installer::test_support::{FakeInstaller, RecordingSink};
    use crate::core::version::resolver::test_support::FakeVersionSource;

    /// Fully faked state; tests swap out the fields they care about.
    pub fn fake_state(reachable: bool) -> AppState {
        AppState {
            settings: LauncherSettings::default(),
            reachability: Arc::new(FixedReachability(reachable)),
            versions: Arc::new(FakeVersionSource::standard()),
            installer: Arc::new(FakeInstaller::default()),
            content: None,
            synthesizer: Arc::new(FakeSynthesizer::returning(&["true"])),
            progress: Arc::new(RecordingSink::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = LauncherSettings::load(&dir.path().join("absent.json"));
        assert_eq!(settings, LauncherSettings::default());
        assert_eq!(settings.content_workers, 10);
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(LauncherSettings::load(&path), LauncherSettings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, r#"{"registry_api_key": "abc", "content_workers": 4}"#).unwrap();

        let settings = LauncherSettings::load(&path);
        assert_eq!(settings.registry_api_key.as_deref(), Some("abc"));
        assert_eq!(settings.content_workers, 4);
        assert_eq!(settings.download_timeout_secs, 180);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);
        let settings = LauncherSettings {
            registry_api_key: Some("key".into()),
            ..Default::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(LauncherSettings::load(&path), settings);
    }

    #[tokio::test]
    async fn registry_client_only_with_a_key() {
        let state = AppState::new(LauncherSettings::default(), true).unwrap();
        assert!(state.content.is_none());
        assert!(!state.reachability.is_reachable().await);

        let keyed = LauncherSettings {
            registry_api_key: Some("key".into()),
            ..Default::default()
        };
        assert!(AppState::new(keyed, true).unwrap().content.is_some());
    }
}
