use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::network::Reachability;
use crate::core::paths::{default_game_dir, expand_full_path};
use crate::core::version::{installed_versions, VersionHints, VersionResolver, VersionSlot, VersionSource};

/// Supported mod loaders.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LoaderType {
    #[default]
    Vanilla,
    Forge,
    Fabric,
}

impl std::fmt::Display for LoaderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoaderType::Vanilla => write!(f, "vanilla"),
            LoaderType::Forge => write!(f, "forge"),
            LoaderType::Fabric => write!(f, "fabric"),
        }
    }
}

/// Explicit field values for a new instance. Version fields are hints:
/// empty means "latest".
#[derive(Debug, Clone)]
pub struct InstanceSpec {
    pub name: String,
    pub root_dir: PathBuf,
    pub base_version: String,
    pub loader: LoaderType,
    pub loader_version: String,
    pub runtime_exec: PathBuf,
    pub runtime_args: Vec<String>,
    pub verify_base_version: bool,
    pub verify_loader_version: bool,
    pub verify_launch_version: bool,
    pub manifest_path: Option<PathBuf>,
}

impl Default for InstanceSpec {
    fn default() -> Self {
        Self {
            name: "minecraft".into(),
            root_dir: default_game_dir(),
            base_version: String::new(),
            loader: LoaderType::Vanilla,
            loader_version: String::new(),
            runtime_exec: PathBuf::new(),
            runtime_args: Vec::new(),
            verify_base_version: true,
            verify_loader_version: true,
            verify_launch_version: true,
            manifest_path: None,
        }
    }
}

/// A game directory plus the versions and runtime used to play it.
///
/// `root_dir` and `runtime_exec` keep `~` and `$VAR` placeholders as given;
/// they are expanded only by the `*_path()` accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    pub root_dir: PathBuf,
    pub base_version: VersionSlot,
    pub loader: LoaderType,
    pub loader_version: VersionSlot,
    #[serde(default)]
    pub runtime_exec: PathBuf,
    #[serde(default)]
    pub runtime_args: Vec<String>,
    #[serde(default = "default_true")]
    pub verify_base_version: bool,
    #[serde(default = "default_true")]
    pub verify_loader_version: bool,
    #[serde(default = "default_true")]
    pub verify_launch_version: bool,
    #[serde(default)]
    pub manifest_path: Option<PathBuf>,
    #[serde(default)]
    pub persistence_path: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Instance {
    /// Build an instance from explicit values, resolving both version hints.
    pub async fn create(
        spec: InstanceSpec,
        reachability: &dyn Reachability,
        source: &dyn VersionSource,
    ) -> Self {
        let hints = VersionHints {
            base: spec.base_version,
            loader: spec.loader,
            loader_version: spec.loader_version,
            verify_base: spec.verify_base_version,
            verify_loader: spec.verify_loader_version,
        };
        let resolved = VersionResolver::new(reachability, source)
            .resolve(&hints)
            .await;

        Self {
            name: spec.name,
            root_dir: spec.root_dir,
            base_version: resolved.base,
            loader: spec.loader,
            loader_version: resolved.loader_version,
            runtime_exec: spec.runtime_exec,
            runtime_args: spec.runtime_args,
            verify_base_version: spec.verify_base_version,
            verify_loader_version: spec.verify_loader_version,
            verify_launch_version: spec.verify_launch_version,
            manifest_path: spec.manifest_path,
            persistence_path: None,
        }
    }

    /// Read a saved instance. Stored versions are trusted as-is.
    pub async fn load(path: &Path) -> LauncherResult<Self> {
        let path = expand_full_path(path);
        if !path.is_file() {
            return Err(LauncherError::InstanceNotFound(path));
        }

        let json = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| LauncherError::io(&path, e))?;
        let mut instance: Instance = serde_json::from_str(&json)?;
        instance.persistence_path = Some(path);
        Ok(instance)
    }

    /// Write to `path`, or to the file this instance was loaded from.
    pub async fn save(&self, path: Option<&Path>) -> LauncherResult<PathBuf> {
        let target = path
            .map(Path::to_path_buf)
            .or_else(|| self.persistence_path.clone())
            .ok_or_else(|| LauncherError::Other(format!("no file to save instance '{}' to", self.name)))?;
        let target = expand_full_path(&target);

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&target, json)
            .await
            .map_err(|e| LauncherError::io(&target, e))?;

        info!("Saved instance '{}' to {:?}", self.name, target);
        Ok(target)
    }

    pub fn root_path(&self) -> PathBuf {
        expand_full_path(&self.root_dir)
    }

    /// Runtime executable, `java` from PATH when none is configured.
    pub fn runtime_exec_path(&self) -> PathBuf {
        if self.runtime_exec.as_os_str().is_empty() {
            PathBuf::from("java")
        } else {
            expand_full_path(&self.runtime_exec)
        }
    }

    pub fn content_dir(&self) -> PathBuf {
        self.root_path().join("mods")
    }

    pub fn installed_versions(&self) -> Vec<String> {
        installed_versions(&self.root_path())
    }
}

impl std::fmt::Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} {}",
            self.name, self.loader, self.base_version
        )?;
        if self.loader != LoaderType::Vanilla {
            write!(f, ", loader {}", self.loader_version)?;
        }
        write!(f, ") at {}", self.root_dir.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::network::FixedReachability;
    use crate::core::version::resolver::test_support::FakeVersionSource;
    use crate::core::version::UnresolvedReason;

    fn sample() -> Instance {
        Instance {
            name: "survival".into(),
            root_dir: PathBuf::from("~/games/$PACK_NAME"),
            base_version: VersionSlot::Resolved("1.20.1".into()),
            loader: LoaderType::Fabric,
            loader_version: VersionSlot::Unresolved(UnresolvedReason::Rejected {
                hint: "0.0.1".into(),
            }),
            runtime_exec: PathBuf::from("$JAVA_HOME/bin/java"),
            runtime_args: vec!["-Xmx4G".into(), "-XX:+UseG1GC".into()],
            verify_base_version: false,
            verify_loader_version: true,
            verify_launch_version: true,
            manifest_path: Some(PathBuf::from("~/packs/manifest.json")),
            persistence_path: None,
        }
    }

    #[tokio::test]
    async fn vanilla_unverified_keeps_hint_and_skips_loader() {
        let source = FakeVersionSource::standard();
        let spec = InstanceSpec {
            base_version: "1.20.1".into(),
            verify_base_version: false,
            ..Default::default()
        };

        let instance = Instance::create(spec, &FixedReachability(false), &source).await;

        assert_eq!(instance.base_version, VersionSlot::Resolved("1.20.1".into()));
        assert_eq!(
            instance.loader_version,
            VersionSlot::Unresolved(UnresolvedReason::NotApplicable)
        );
        assert_eq!(instance.loader_version.to_string(), "Invalid");
    }

    #[tokio::test]
    async fn save_then_load_round_trips_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instance.json");

        let mut original = sample();
        original.save(Some(&path)).await.unwrap();
        let loaded = Instance::load(&path).await.unwrap();

        original.persistence_path = Some(path.clone());
        assert_eq!(loaded, original);

        // A second pass through disk changes nothing
        loaded.save(None).await.unwrap();
        assert_eq!(Instance::load(&path).await.unwrap(), loaded);
    }

    #[tokio::test]
    async fn stored_paths_stay_unexpanded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instance.json");
        sample().save(Some(&path)).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["root_dir"], "~/games/$PACK_NAME");
        assert_eq!(raw["runtime_exec"], "$JAVA_HOME/bin/java");
        assert_eq!(raw["base_version"], "1.20.1");
        assert_eq!(raw["loader"], "fabric");
    }

    #[tokio::test]
    async fn legacy_invalid_marker_loads_as_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.json");
        std::fs::write(
            &path,
            r#"{"name":"old","root_dir":"/tmp/mc","base_version":"Invalid",
                "loader":"vanilla","loader_version":"Invalid"}"#,
        )
        .unwrap();

        let instance = Instance::load(&path).await.unwrap();
        assert_eq!(
            instance.base_version,
            VersionSlot::Unresolved(UnresolvedReason::Persisted)
        );
        assert!(instance.verify_launch_version);
        assert_eq!(instance.persistence_path.as_deref(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Instance::load(&dir.path().join("nope.json")).await.unwrap_err();
        assert!(matches!(err, LauncherError::InstanceNotFound(_)));
    }

    #[tokio::test]
    async fn save_without_any_path_fails() {
        assert!(sample().save(None).await.is_err());
    }

    #[test]
    fn empty_runtime_exec_falls_back_to_java() {
        let mut instance = sample();
        instance.runtime_exec = PathBuf::new();
        assert_eq!(instance.runtime_exec_path(), PathBuf::from("java"));
    }
}
