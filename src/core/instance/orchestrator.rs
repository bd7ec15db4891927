// ─── Install Orchestrator ───
// Brings an instance's game directory up to its resolved versions and keeps
// those versions current. Every operation reports a plain success flag; the
// underlying error is logged here and goes no further.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::core::content::{
    ContentDownloadWorker, ContentInstallReport, ContentManifest, ContentManifestEntry,
    ContentSource, ItemOutcome,
};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::loaders::forge::qualify_forge_version;
use crate::core::loaders::{InstallProgress, InstallRequest};
use crate::core::state::AppState;
use crate::core::version::VersionSlot;

use super::model::{Instance, LoaderType};

pub struct InstallOrchestrator<'a> {
    state: &'a AppState,
}

impl<'a> InstallOrchestrator<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Base game plus loader, then content. Content is skipped when the
    /// base install fails.
    pub async fn install(&self, instance: &Instance) -> bool {
        self.install_base(instance).await && self.install_content(instance).await
    }

    pub async fn install_base(&self, instance: &Instance) -> bool {
        match self.try_install_base(instance).await {
            Ok(id) => {
                info!("Installed {} for instance '{}'", id, instance.name);
                true
            }
            Err(e) => {
                warn!("Installing instance '{}' failed: {}", instance.name, e);
                false
            }
        }
    }

    async fn try_install_base(&self, instance: &Instance) -> LauncherResult<String> {
        if !self.state.reachability.is_reachable().await {
            return Err(LauncherError::Unreachable(
                "installing requires network access".into(),
            ));
        }

        let base_version = instance.base_version.require("base version")?;
        let loader_version = match instance.loader {
            LoaderType::Vanilla => "",
            _ => instance.loader_version.require("loader version")?,
        };

        let root_dir = instance.root_path();
        let runtime_exec = instance.runtime_exec_path();
        tokio::fs::create_dir_all(&root_dir)
            .await
            .map_err(|e| LauncherError::io(&root_dir, e))?;

        let progress = InstallProgress::new(Arc::clone(&self.state.progress));
        let request = InstallRequest {
            loader: instance.loader,
            base_version,
            loader_version,
            root_dir: &root_dir,
            runtime_exec: &runtime_exec,
        };
        self.state.installer.install(request, &progress).await
    }

    /// Install the manifest's content. No manifest configured is a success.
    pub async fn install_content(&self, instance: &Instance) -> bool {
        let Some(manifest_path) = instance.manifest_path.as_deref() else {
            debug!("Instance '{}' has no content manifest", instance.name);
            return true;
        };

        match self.try_install_content(instance, manifest_path).await {
            Ok(report) => report.is_success(),
            Err(e) => {
                warn!("Installing content for '{}' failed: {}", instance.name, e);
                false
            }
        }
    }

    async fn try_install_content(
        &self,
        instance: &Instance,
        manifest_path: &Path,
    ) -> LauncherResult<ContentInstallReport> {
        let source = self.content_source()?;
        let manifest = ContentManifest::load(manifest_path).await?;
        let worker = ContentDownloadWorker::new(source, instance.content_dir());
        Ok(worker
            .install_all(&manifest.files, self.state.settings.content_workers)
            .await)
    }

    /// Install one registry item into the content directory.
    pub async fn install_item(&self, instance: &Instance, entry: &ContentManifestEntry) -> bool {
        let source = match self.content_source() {
            Ok(source) => source,
            Err(e) => {
                warn!("Cannot install {}: {}", entry, e);
                return false;
            }
        };
        let worker = ContentDownloadWorker::new(source, instance.content_dir());
        let label = format!("[item {}]", entry);
        worker.install_item(entry, &label).await != ItemOutcome::Failed
    }

    fn content_source(&self) -> LauncherResult<Arc<dyn ContentSource>> {
        self.state.content.clone().ok_or_else(|| {
            LauncherError::Registry(
                "no registry API key configured (use --api-key or `settings set-api-key`)".into(),
            )
        })
    }

    /// Move to the latest base version (vanilla) or loader version.
    pub async fn update(&self, instance: &mut Instance, save: bool, path: Option<&Path>) -> bool {
        match instance.loader {
            LoaderType::Vanilla => self.update_base(instance, save, path).await,
            _ => self.update_loader(instance, save, path).await,
        }
    }

    pub async fn update_base(&self, instance: &mut Instance, save: bool, path: Option<&Path>) -> bool {
        if !self.state.reachability.is_reachable().await {
            warn!("No network access, cannot update '{}'", instance.name);
            return false;
        }

        let latest = match self.state.versions.latest_release().await {
            Ok(latest) => latest,
            Err(e) => {
                warn!("Could not look up the latest Minecraft release: {}", e);
                return false;
            }
        };

        self.apply_update(instance, latest, UpdateTarget::Base, save, path)
            .await
    }

    pub async fn update_loader(&self, instance: &mut Instance, save: bool, path: Option<&Path>) -> bool {
        if instance.loader == LoaderType::Vanilla {
            warn!("Instance '{}' has no loader to update", instance.name);
            return false;
        }
        if !self.state.reachability.is_reachable().await {
            warn!("No network access, cannot update '{}'", instance.name);
            return false;
        }

        let base = match instance.base_version.require("base version") {
            Ok(base) => base.to_string(),
            Err(e) => {
                warn!("Cannot update the {} version: {}", instance.loader, e);
                return false;
            }
        };

        let latest = match self.state.versions.latest_loader(instance.loader, &base).await {
            Ok(Some(latest)) => latest,
            Ok(None) => {
                warn!("No {} version found for Minecraft {}", instance.loader, base);
                return false;
            }
            Err(e) => {
                warn!("Could not look up the latest {} version: {}", instance.loader, e);
                return false;
            }
        };

        self.apply_update(instance, latest, UpdateTarget::Loader, save, path)
            .await
    }

    async fn apply_update(
        &self,
        instance: &mut Instance,
        latest: String,
        target: UpdateTarget,
        save: bool,
        path: Option<&Path>,
    ) -> bool {
        if current_version(instance, target).as_deref() == Some(latest.as_str()) {
            info!("{} is already up to date", latest);
            return true;
        }

        let slot = match target {
            UpdateTarget::Base => &mut instance.base_version,
            UpdateTarget::Loader => &mut instance.loader_version,
        };

        info!("Updating {} to {}", slot, latest);
        *slot = VersionSlot::Resolved(latest);

        if !save {
            return true;
        }
        match instance.save(path).await {
            Ok(_) => true,
            Err(e) => {
                error!("Could not save instance '{}': {}", instance.name, e);
                false
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum UpdateTarget {
    Base,
    Loader,
}

/// Stored version in the spelling the catalog reports. Forge builds may be
/// stored bare (`47.2.0`) while the catalog lists `1.20.1-47.2.0`.
fn current_version(instance: &Instance, target: UpdateTarget) -> Option<String> {
    match target {
        UpdateTarget::Base => instance.base_version.as_resolved().map(str::to_string),
        UpdateTarget::Loader => {
            let stored = instance.loader_version.as_resolved()?;
            match (instance.loader, instance.base_version.as_resolved()) {
                (LoaderType::Forge, Some(base)) => Some(qualify_forge_version(base, stored)),
                _ => Some(stored.to_string()),
            }
        }
    }
}
