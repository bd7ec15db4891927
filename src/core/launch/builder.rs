// ─── Launch Command Builder ───
// Picks the version id the installer produced for this instance, checks that
// it is installed and hands the identity to the command synthesizer.

use std::path::PathBuf;

use tracing::{debug, error};

use crate::core::auth::Identity;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::instance::{Instance, LoaderType};
use crate::core::loaders::fabric::fabric_version_id;
use crate::core::loaders::forge::forge_installed_version;
use crate::core::paths::expand_full_path;
use crate::core::version::installed_versions;

use super::CommandSynthesizer;

/// Per-launch overrides of the instance's stored settings.
#[derive(Debug, Clone, Default)]
pub struct LaunchOverrides {
    pub runtime_exec: Option<PathBuf>,
    /// Replaces the instance's JVM arguments when non-empty.
    pub runtime_args: Vec<String>,
    pub verify_launch_version: Option<bool>,
}

/// Version id under `versions/` that launching this instance runs.
pub fn effective_version(instance: &Instance) -> LauncherResult<String> {
    let base = instance.base_version.require("base version")?;
    match instance.loader {
        LoaderType::Vanilla => Ok(base.to_string()),
        LoaderType::Forge => Ok(forge_installed_version(
            base,
            instance.loader_version.require("Forge version")?,
        )),
        LoaderType::Fabric => Ok(fabric_version_id(
            base,
            instance.loader_version.require("Fabric version")?,
        )),
    }
}

pub struct LaunchCommandBuilder<'a> {
    synthesizer: &'a dyn CommandSynthesizer,
}

impl<'a> LaunchCommandBuilder<'a> {
    pub fn new(synthesizer: &'a dyn CommandSynthesizer) -> Self {
        Self { synthesizer }
    }

    pub fn build(
        &self,
        instance: &Instance,
        identity: &Identity,
        overrides: &LaunchOverrides,
    ) -> LauncherResult<Vec<String>> {
        let version = effective_version(instance)?;
        let root = instance.root_path();

        let verify = overrides
            .verify_launch_version
            .unwrap_or(instance.verify_launch_version);
        if verify && !installed_versions(&root).contains(&version) {
            error!(
                "Cannot launch {} version {}: it is not installed in {:?}",
                instance.loader, version, root
            );
            return Err(LauncherError::NotInstalled(version));
        }

        let mut options = identity.to_launch_options();
        options.executable_path = match &overrides.runtime_exec {
            Some(exec) if !exec.as_os_str().is_empty() => expand_full_path(exec),
            _ => instance.runtime_exec_path(),
        };

        let jvm_args = if overrides.runtime_args.is_empty() {
            &instance.runtime_args
        } else {
            &overrides.runtime_args
        };
        if !jvm_args.is_empty() {
            options.jvm_arguments = Some(jvm_args.clone());
        }

        debug!("Synthesizing launch command for {}", version);
        self.synthesizer.synthesize(&version, &root, &options)
    }
}
