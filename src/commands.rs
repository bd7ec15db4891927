use std::path::Path;

use tracing::{error, info};

use crate::cli::{
    split_args, AccountCommand, Cli, Command, CreateArgs, IdentityArgs, InstanceCommand, RunArgs,
    SettingsCommand, UpdateArgs,
};
use crate::core::auth::Identity;
use crate::core::error::LauncherResult;
use crate::core::instance::{Instance, InstanceSpec};
use crate::core::launch::LaunchOverrides;
use crate::core::paths::default_game_dir;
use crate::core::state::{default_settings_path, AppState, LauncherSettings};

pub const EXIT_OK: i32 = 0;
/// An operation ran and failed.
pub const EXIT_FAILED: i32 = 1;
/// A required instance or account file could not be loaded.
pub const EXIT_LOAD_FAILED: i32 = -1;

fn exit_status(ok: bool) -> i32 {
    if ok {
        EXIT_OK
    } else {
        EXIT_FAILED
    }
}

/// Process exit code for a finished game: 0 stays 0, anything else is
/// reported as `100 + code` unless that sum is exactly 0.
pub fn launch_exit_code(game_code: i32) -> i32 {
    if game_code == 0 {
        return EXIT_OK;
    }
    match 100 + game_code {
        0 => game_code,
        code => code,
    }
}

pub async fn dispatch(cli: Cli) -> i32 {
    let settings_path = cli.settings.clone().unwrap_or_else(default_settings_path);
    let stored = LauncherSettings::load(&settings_path);

    let mut settings = stored.clone();
    if let Some(key) = cli.api_key.clone() {
        settings.registry_api_key = Some(key);
    }
    if let Some(workers) = cli.workers {
        settings.content_workers = workers;
    }

    match cli.command {
        Command::Settings(cmd) => settings_command(cmd, stored, settings, &settings_path),
        Command::Account(cmd) => account_command(cmd).await,
        Command::Instance(cmd) => {
            let state = match AppState::new(settings, cli.offline) {
                Ok(state) => state,
                Err(e) => {
                    error!("Could not initialize launcher: {}", e);
                    return EXIT_FAILED;
                }
            };
            instance_command(cmd, &state).await
        }
    }
}

// ─── Instance ───

async fn instance_command(cmd: InstanceCommand, state: &AppState) -> i32 {
    match cmd {
        InstanceCommand::Create(args) => create_instance(args, state).await,
        InstanceCommand::Show(args) => with_instance(&args.file, |instance| async move {
            print_json(&instance)
        })
        .await,
        InstanceCommand::Install(args) => with_instance(&args.file, |instance| async move {
            exit_status(instance.install(state).await)
        })
        .await,
        InstanceCommand::InstallBase(args) => with_instance(&args.file, |instance| async move {
            exit_status(instance.install_base(state).await)
        })
        .await,
        InstanceCommand::InstallContent(args) => with_instance(&args.file, |instance| async move {
            exit_status(instance.install_content(state).await)
        })
        .await,
        InstanceCommand::InstallItem(args) => with_instance(&args.file, |instance| async move {
            exit_status(
                instance
                    .install_item(state, &args.project_id, &args.file_id)
                    .await,
            )
        })
        .await,
        InstanceCommand::Update(args) => update_instance(args, state, UpdateKind::Auto).await,
        InstanceCommand::UpdateBase(args) => update_instance(args, state, UpdateKind::Base).await,
        InstanceCommand::UpdateLoader(args) => {
            update_instance(args, state, UpdateKind::Loader).await
        }
        InstanceCommand::Run(args) => run_instance(args, state).await,
    }
}

async fn load_instance(path: &Path) -> Option<Instance> {
    match Instance::load(path).await {
        Ok(instance) => Some(instance),
        Err(e) => {
            error!("Could not load instance {:?}: {}", path, e);
            None
        }
    }
}

async fn with_instance<F, Fut>(path: &Path, op: F) -> i32
where
    F: FnOnce(Instance) -> Fut,
    Fut: std::future::Future<Output = i32>,
{
    match load_instance(path).await {
        Some(instance) => op(instance).await,
        None => EXIT_LOAD_FAILED,
    }
}

async fn create_instance(args: CreateArgs, state: &AppState) -> i32 {
    let spec = InstanceSpec {
        name: args.name,
        root_dir: args.root_dir.unwrap_or_else(default_game_dir),
        base_version: args.base_version,
        loader: args.loader,
        loader_version: args.loader_version,
        runtime_exec: args.java.unwrap_or_default(),
        runtime_args: split_args(args.jvm_args.as_deref()),
        verify_base_version: !args.no_verify_base,
        verify_loader_version: !args.no_verify_loader,
        verify_launch_version: !args.no_verify_launch,
        manifest_path: args.manifest,
    };

    let instance =
        Instance::create(spec, state.reachability.as_ref(), state.versions.as_ref()).await;
    info!("Created {}", instance);

    match instance.save(Some(&args.out)).await {
        Ok(_) => EXIT_OK,
        Err(e) => {
            error!("Could not save instance to {:?}: {}", args.out, e);
            EXIT_FAILED
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum UpdateKind {
    Auto,
    Base,
    Loader,
}

async fn update_instance(args: UpdateArgs, state: &AppState, kind: UpdateKind) -> i32 {
    let Some(mut instance) = load_instance(&args.file).await else {
        return EXIT_LOAD_FAILED;
    };

    let save = !args.no_save;
    let out = args.out.as_deref();
    let ok = match kind {
        UpdateKind::Auto => instance.update(state, save, out).await,
        UpdateKind::Base => instance.update_base(state, save, out).await,
        UpdateKind::Loader => instance.update_loader(state, save, out).await,
    };
    exit_status(ok)
}

async fn resolve_identity(args: &IdentityArgs) -> Option<Identity> {
    if let Some(path) = &args.account {
        return match Identity::load(path).await {
            Ok(identity) => Some(identity),
            Err(e) => {
                error!("Could not load account {:?}: {}", path, e);
                None
            }
        };
    }

    match &args.username {
        Some(username) => Some(Identity::new(
            args.account_name.as_deref().unwrap_or(username),
            username,
            args.uuid,
            args.token.as_deref().unwrap_or_default(),
        )),
        None => {
            error!("No account given: pass --account FILE or --username NAME");
            None
        }
    }
}

async fn run_instance(args: RunArgs, state: &AppState) -> i32 {
    let Some(instance) = load_instance(&args.file).await else {
        return EXIT_LOAD_FAILED;
    };
    let Some(identity) = resolve_identity(&args.identity).await else {
        return EXIT_LOAD_FAILED;
    };

    let overrides = LaunchOverrides {
        runtime_exec: args.java,
        runtime_args: split_args(args.jvm_args.as_deref()),
        verify_launch_version: args.no_verify_launch.then_some(false),
    };

    let game_code = instance.launch(state, &identity, &overrides).await;
    if game_code == 0 {
        info!("Game exited normally with code 0");
        return EXIT_OK;
    }

    let code = launch_exit_code(game_code);
    error!(
        "Game exited abnormally with code {}, exiting with code {} (100+{})",
        game_code, code, game_code
    );
    code
}

// ─── Account ───

async fn account_command(cmd: AccountCommand) -> i32 {
    match cmd {
        AccountCommand::Create {
            out,
            username,
            name,
            uuid,
            token,
        } => {
            let identity = Identity::new(name.as_deref().unwrap_or(&username), &username, uuid, &token);
            match identity.save(&out).await {
                Ok(()) => {
                    info!("Created account {}", identity);
                    EXIT_OK
                }
                Err(e) => {
                    error!("Could not save account to {:?}: {}", out, e);
                    EXIT_FAILED
                }
            }
        }
        AccountCommand::Show { file } => match Identity::load(&file).await {
            Ok(identity) => print_json(&identity),
            Err(e) => {
                error!("Could not load account {:?}: {}", file, e);
                EXIT_LOAD_FAILED
            }
        },
    }
}

// ─── Settings ───

fn settings_command(
    cmd: SettingsCommand,
    stored: LauncherSettings,
    effective: LauncherSettings,
    path: &Path,
) -> i32 {
    match cmd {
        SettingsCommand::Show => {
            let mut shown = effective;
            if shown.registry_api_key.is_some() {
                shown.registry_api_key = Some("<set>".into());
            }
            println!("# {}", path.display());
            print_json(&shown)
        }
        SettingsCommand::SetApiKey { key } => {
            let updated = LauncherSettings {
                registry_api_key: Some(key),
                ..stored
            };
            exit_status(save_settings(&updated, path).is_ok())
        }
    }
}

fn save_settings(settings: &LauncherSettings, path: &Path) -> LauncherResult<()> {
    settings.save(path).inspect_err(|e| {
        error!("Could not save settings to {:?}: {}", path, e);
    })?;
    info!("Saved settings to {:?}", path);
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            EXIT_OK
        }
        Err(e) => {
            error!("Could not serialize output: {}", e);
            EXIT_FAILED
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_exit_codes_are_offset_by_one_hundred() {
        assert_eq!(launch_exit_code(0), 0);
        assert_eq!(launch_exit_code(1), 101);
        assert_eq!(launch_exit_code(-1), 99);
        assert_eq!(launch_exit_code(-100), -100);
    }

    #[tokio::test]
    async fn missing_instance_file_exits_with_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let state = crate::core::state::app_state::test_support::fake_state(false);
        let code = instance_command(
            InstanceCommand::Install(crate::cli::InstanceFile {
                file: dir.path().join("missing.json"),
            }),
            &state,
        )
        .await;
        assert_eq!(code, EXIT_LOAD_FAILED);
    }

    #[tokio::test]
    async fn set_api_key_keeps_other_stored_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launcher_settings.json");
        let stored = LauncherSettings {
            content_workers: 3,
            ..Default::default()
        };
        let effective = LauncherSettings {
            content_workers: 16,
            ..stored.clone()
        };

        let code = settings_command(
            SettingsCommand::SetApiKey { key: "k".into() },
            stored,
            effective,
            &path,
        );

        assert_eq!(code, EXIT_OK);
        let saved = LauncherSettings::load(&path);
        assert_eq!(saved.registry_api_key.as_deref(), Some("k"));
        assert_eq!(saved.content_workers, 3);
    }

    #[tokio::test]
    async fn account_create_then_show() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("alex.json");
        let code = account_command(AccountCommand::Create {
            out: out.clone(),
            username: "Alex".into(),
            name: None,
            uuid: None,
            token: String::new(),
        })
        .await;
        assert_eq!(code, EXIT_OK);

        let identity = Identity::load(&out).await.unwrap();
        assert_eq!(identity.name(), "Alex");
        assert_eq!(identity.display_name(), "Alex");

        assert_eq!(
            account_command(AccountCommand::Show {
                file: dir.path().join("nobody.json")
            })
            .await,
            EXIT_LOAD_FAILED
        );
    }
}
