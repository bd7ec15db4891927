// Instance entry points: install, update and launch.

use std::path::Path;

use tracing::{error, info};

use crate::core::auth::Identity;
use crate::core::content::ContentManifestEntry;
use crate::core::error::LauncherResult;
use crate::core::launch::{
    run_command, LaunchCommandBuilder, LaunchOverrides, INSTALL_BEFORE_LAUNCH_FAILED, LAUNCH_FAILED,
};
use crate::core::state::AppState;

use super::model::Instance;
use super::orchestrator::InstallOrchestrator;

impl Instance {
    pub async fn install(&self, state: &AppState) -> bool {
        InstallOrchestrator::new(state).install(self).await
    }

    pub async fn install_base(&self, state: &AppState) -> bool {
        InstallOrchestrator::new(state).install_base(self).await
    }

    pub async fn install_content(&self, state: &AppState) -> bool {
        InstallOrchestrator::new(state).install_content(self).await
    }

    pub async fn install_item(&self, state: &AppState, project_id: &str, file_id: &str) -> bool {
        InstallOrchestrator::new(state)
            .install_item(self, &ContentManifestEntry::new(project_id, file_id))
            .await
    }

    pub async fn update(&mut self, state: &AppState, save: bool, path: Option<&Path>) -> bool {
        InstallOrchestrator::new(state).update(self, save, path).await
    }

    pub async fn update_base(&mut self, state: &AppState, save: bool, path: Option<&Path>) -> bool {
        InstallOrchestrator::new(state).update_base(self, save, path).await
    }

    pub async fn update_loader(&mut self, state: &AppState, save: bool, path: Option<&Path>) -> bool {
        InstallOrchestrator::new(state).update_loader(self, save, path).await
    }

    /// The full argv for launching as `identity`, or why there is none.
    pub fn launch_command(
        &self,
        state: &AppState,
        identity: &Identity,
        overrides: &LaunchOverrides,
    ) -> LauncherResult<Vec<String>> {
        LaunchCommandBuilder::new(state.synthesizer.as_ref()).build(self, identity, overrides)
    }

    /// Run the game and return its exit code, or [`LAUNCH_FAILED`] when no
    /// process was started. A game directory with nothing installed gets a
    /// base install first; if that fails the result is
    /// [`INSTALL_BEFORE_LAUNCH_FAILED`].
    pub async fn launch(
        &self,
        state: &AppState,
        identity: &Identity,
        overrides: &LaunchOverrides,
    ) -> i32 {
        if self.installed_versions().is_empty() {
            info!("Nothing installed in {:?} yet, installing first", self.root_dir);
            if !self.install_base(state).await {
                error!("Install before launch failed for '{}'", self.name);
                // Not the command-build failure below
                return INSTALL_BEFORE_LAUNCH_FAILED;
            }
        }

        let command = match self.launch_command(state, identity, overrides) {
            Ok(command) => command,
            Err(e) => {
                error!("Cannot launch '{}': {}", self.name, e);
                return LAUNCH_FAILED;
            }
        };

        match run_command(&command, &self.root_path()).await {
            Ok(code) => code,
            Err(e) => {
                error!("Launching '{}' failed: {}", self.name, e);
                LAUNCH_FAILED
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::*;
    use crate::core::instance::LoaderType;
    use crate::core::launch::builder::test_support::FakeSynthesizer;
    use crate::core::loaders::installer::test_support::FakeInstaller;
    use crate::core::state::app_state::test_support::fake_state;
    use crate::core::version::{UnresolvedReason, VersionSlot};

    fn instance(root: &Path) -> Instance {
        Instance {
            name: "test".into(),
            root_dir: root.to_path_buf(),
            base_version: VersionSlot::Resolved("1.20.1".into()),
            loader: LoaderType::Vanilla,
            loader_version: VersionSlot::Unresolved(UnresolvedReason::NotApplicable),
            runtime_exec: PathBuf::new(),
            runtime_args: vec![],
            verify_base_version: true,
            verify_loader_version: true,
            verify_launch_version: true,
            manifest_path: None,
            persistence_path: None,
        }
    }

    fn install_version(root: &Path, id: &str) {
        let dir = root.join("versions").join(id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{id}.json")), "{}").unwrap();
    }

    fn identity() -> Identity {
        Identity::new("main", "Alex", None, "")
    }

    #[tokio::test]
    async fn missing_version_never_spawns() {
        let dir = tempfile::tempdir().unwrap();
        install_version(dir.path(), "1.19.4");
        let synth = Arc::new(FakeSynthesizer::returning(&["sh", "-c", "touch spawned"]));
        let mut state = fake_state(true);
        state.synthesizer = synth.clone();
        let inst = instance(dir.path());

        assert!(inst
            .launch_command(&state, &identity(), &LaunchOverrides::default())
            .is_err());
        assert_eq!(
            inst.launch(&state, &identity(), &LaunchOverrides::default()).await,
            LAUNCH_FAILED
        );
        assert!(synth.calls.lock().unwrap().is_empty());
        assert!(!dir.path().join("spawned").exists());
    }

    #[tokio::test]
    async fn failed_auto_install_is_reported_as_install_failure() {
        let dir = tempfile::tempdir().unwrap();
        let synth = Arc::new(FakeSynthesizer::returning(&["true"]));
        let mut state = fake_state(false);
        state.synthesizer = synth.clone();

        let code = instance(dir.path())
            .launch(&state, &identity(), &LaunchOverrides::default())
            .await;
        assert_eq!(code, INSTALL_BEFORE_LAUNCH_FAILED);
        assert_ne!(code, LAUNCH_FAILED);
        assert!(synth.calls.lock().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn empty_game_dir_is_installed_then_launched() {
        let dir = tempfile::tempdir().unwrap();
        let installer = Arc::new(FakeInstaller::default());
        let mut state = fake_state(true);
        state.installer = installer.clone();
        state.synthesizer = Arc::new(FakeSynthesizer::returning(&["sh", "-c", "exit 0"]));

        let code = instance(dir.path())
            .launch(&state, &identity(), &LaunchOverrides::default())
            .await;

        assert_eq!(code, 0);
        assert_eq!(installer.requests.lock().unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn game_exit_code_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        install_version(dir.path(), "1.20.1");
        let mut state = fake_state(true);
        state.synthesizer = Arc::new(FakeSynthesizer::returning(&["sh", "-c", "exit 1"]));

        let code = instance(dir.path())
            .launch(&state, &identity(), &LaunchOverrides::default())
            .await;
        assert_eq!(code, 1);
    }
}
