// ─── Command Synthesis ───
// Turns an installed version JSON plus launch options into a full argv.

use std::path::Path;

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::{version_jar_path, VersionJson};

use super::LaunchOptions;

const LAUNCHER_NAME: &str = "blocklaunch";

/// Builds the process argument vector for an installed version.
pub trait CommandSynthesizer: Send + Sync {
    fn synthesize(
        &self,
        version_id: &str,
        root_dir: &Path,
        options: &LaunchOptions,
    ) -> LauncherResult<Vec<String>>;
}

/// Reads `versions/<id>/<id>.json` (with its parents) from the game directory.
pub struct VersionJsonSynthesizer;

impl CommandSynthesizer for VersionJsonSynthesizer {
    fn synthesize(
        &self,
        version_id: &str,
        root_dir: &Path,
        options: &LaunchOptions,
    ) -> LauncherResult<Vec<String>> {
        let version = VersionJson::load_merged(root_dir, version_id)?;
        if version.main_class.trim().is_empty() {
            return Err(LauncherError::Other(format!(
                "{version_id} has no mainClass"
            )));
        }

        let classpath = build_classpath(&version, root_dir)?;
        debug!("Classpath has {} entries", classpath.split(classpath_separator()).count());

        let placeholders = Placeholders::new(&version, version_id, root_dir, &classpath, options);

        let mut command = vec![path_str(&options.executable_path)];
        command.extend(substitute_args(&version.jvm_args(), &placeholders));
        if let Some(extra) = &options.jvm_arguments {
            command.extend(extra.iter().cloned());
        }
        command.push(version.main_class.clone());
        command.extend(substitute_args(&version.game_args(), &placeholders));

        Ok(command)
    }
}

/// Platform-specific Java classpath separator.
pub fn classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// OS-allowed libraries in declaration order, then the game jar.
fn build_classpath(version: &VersionJson, root_dir: &Path) -> LauncherResult<String> {
    let libs_dir = root_dir.join("libraries");
    let mut entries: Vec<String> = Vec::new();

    for lib in version.allowed_libraries() {
        let entry = path_str(&libs_dir.join(lib.relative_path()?));
        if !entries.contains(&entry) {
            entries.push(entry);
        }
    }
    entries.push(path_str(&version_jar_path(root_dir, version.jar_id())));

    Ok(entries.join(classpath_separator()))
}

struct Placeholders {
    values: Vec<(&'static str, String)>,
}

impl Placeholders {
    fn new(
        version: &VersionJson,
        version_id: &str,
        root_dir: &Path,
        classpath: &str,
        options: &LaunchOptions,
    ) -> Self {
        let assets_dir = root_dir.join("assets");
        let assets_index = version
            .assets
            .clone()
            .or_else(|| version.asset_index.as_ref().map(|a| a.id.clone()))
            .unwrap_or_else(|| "legacy".into());

        let values = vec![
            ("natives_directory", path_str(&root_dir.join("versions").join(version_id).join("natives"))),
            ("launcher_name", LAUNCHER_NAME.to_string()),
            ("launcher_version", env!("CARGO_PKG_VERSION").to_string()),
            ("classpath_separator", classpath_separator().to_string()),
            ("classpath", classpath.to_string()),
            ("library_directory", path_str(&root_dir.join("libraries"))),
            ("auth_player_name", options.username.clone()),
            ("version_name", version_id.to_string()),
            ("game_directory", path_str(root_dir)),
            ("assets_root", path_str(&assets_dir)),
            ("game_assets", path_str(&assets_dir.join("virtual").join("legacy"))),
            ("assets_index_name", assets_index),
            ("auth_uuid", options.uuid.clone()),
            ("auth_access_token", options.token.clone()),
            ("auth_session", options.token.clone()),
            ("user_type", "msa".to_string()),
            ("user_properties", "{}".to_string()),
            (
                "version_type",
                version.version_type.clone().unwrap_or_else(|| "release".into()),
            ),
        ];
        Self { values }
    }

    fn apply(&self, arg: &str) -> String {
        let mut resolved = arg.to_string();
        for (key, value) in &self.values {
            resolved = resolved.replace(&format!("${{{key}}}"), value);
        }
        resolved
    }
}

/// Substitute known placeholders; an argument that still holds one is
/// dropped together with the option flag in front of it.
fn substitute_args(raw_args: &[String], placeholders: &Placeholders) -> Vec<String> {
    let mut sanitized = Vec::with_capacity(raw_args.len());
    for arg in raw_args {
        let resolved = placeholders.apply(arg);
        if resolved.contains("${") {
            drop_dangling_option(&mut sanitized);
            continue;
        }
        sanitized.push(resolved);
    }
    sanitized
}

fn drop_dangling_option(args: &mut Vec<String>) {
    if args.last().is_some_and(|last| last.starts_with('-')) {
        let _ = args.pop();
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn write_version(root: &Path, id: &str, json: &str) {
        let dir = root.join("versions").join(id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{id}.json")), json).unwrap();
    }

    fn options() -> LaunchOptions {
        LaunchOptions {
            username: "Steve".into(),
            uuid: "0f6e8a2c-7c3b-4f4e-9a47-2b1e0c9d1a11".into(),
            token: "tok".into(),
            executable_path: PathBuf::from("/opt/java/bin/java"),
            jvm_arguments: Some(vec!["-Xmx2G".into()]),
        }
    }

    #[test]
    fn legacy_version_gets_default_jvm_args_and_split_game_args() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_version(
            root,
            "1.12.2",
            r#"{
                "id": "1.12.2",
                "mainClass": "net.minecraft.client.main.Main",
                "assets": "1.12",
                "libraries": [{"name": "com.mojang:patchy:1.1"}],
                "minecraftArguments": "--username ${auth_player_name} --version ${version_name} --gameDir ${game_directory} --assetIndex ${assets_index_name} --uuid ${auth_uuid} --accessToken ${auth_access_token} --userType ${user_type}"
            }"#,
        );

        let cmd = VersionJsonSynthesizer
            .synthesize("1.12.2", root, &options())
            .unwrap();

        assert_eq!(cmd[0], "/opt/java/bin/java");
        assert!(cmd[1].starts_with("-Djava.library.path="));
        assert_eq!(cmd[2], "-cp");
        let classpath = &cmd[3];
        assert!(classpath.contains("patchy-1.1.jar"));
        assert!(classpath.ends_with(&path_str(&version_jar_path(root, "1.12.2"))));
        assert_eq!(cmd[4], "-Xmx2G");
        assert_eq!(cmd[5], "net.minecraft.client.main.Main");

        let game = &cmd[6..];
        assert_eq!(game[0..2], ["--username".to_string(), "Steve".to_string()]);
        assert!(game.windows(2).any(|w| w[0] == "--assetIndex" && w[1] == "1.12"));
        assert!(game.windows(2).any(|w| w[0] == "--accessToken" && w[1] == "tok"));
    }

    #[test]
    fn child_profile_uses_parent_jar_and_drops_unknown_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_version(
            root,
            "1.20.1",
            r#"{
                "id": "1.20.1",
                "mainClass": "net.minecraft.client.main.Main",
                "type": "release",
                "assetIndex": {"id": "5", "url": "https://example.invalid/5.json"},
                "libraries": [],
                "arguments": {
                    "game": ["--username", "${auth_player_name}", "--xuid", "${auth_xuid}", "--versionType", "${version_type}"],
                    "jvm": ["-cp", "${classpath}"]
                }
            }"#,
        );
        write_version(
            root,
            "1.20.1-fabric-0.15.7",
            r#"{
                "id": "1.20.1-fabric-0.15.7",
                "inheritsFrom": "1.20.1",
                "mainClass": "net.fabricmc.loader.impl.launch.knot.KnotClient",
                "libraries": [{"name": "net.fabricmc:fabric-loader:0.15.7", "url": "https://maven.fabricmc.net/"}],
                "arguments": {"game": [], "jvm": ["-DFabricMcEmu= net.minecraft.client.main.Main "]}
            }"#,
        );

        let mut opts = options();
        opts.jvm_arguments = None;
        let cmd = VersionJsonSynthesizer
            .synthesize("1.20.1-fabric-0.15.7", root, &opts)
            .unwrap();

        let main_at = cmd
            .iter()
            .position(|a| a == "net.fabricmc.loader.impl.launch.knot.KnotClient")
            .unwrap();
        let classpath = &cmd[cmd.iter().position(|a| a == "-cp").unwrap() + 1];
        assert!(classpath.contains("fabric-loader-0.15.7.jar"));
        assert!(classpath.ends_with(&path_str(&version_jar_path(root, "1.20.1"))));

        let game = &cmd[main_at + 1..];
        assert!(!game.iter().any(|a| a == "--xuid" || a.contains("${")));
        assert!(game.windows(2).any(|w| w[0] == "--versionType" && w[1] == "release"));
    }

    #[test]
    fn missing_version_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(VersionJsonSynthesizer
            .synthesize("1.20.1", dir.path(), &options())
            .is_err());
    }

    #[test]
    fn dangling_option_is_removed_with_its_value() {
        let placeholders = Placeholders { values: vec![] };
        let args = vec![
            "--demo".to_string(),
            "--clientId".to_string(),
            "${clientid}".to_string(),
        ];
        assert_eq!(substitute_args(&args, &placeholders), vec!["--demo".to_string()]);
    }
}
