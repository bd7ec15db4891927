// ─── Launch Task ───
// Spawns the game process and waits for it to exit.

use std::path::Path;
use std::process::Stdio;

use tracing::{debug, info, warn};

use crate::core::error::{LauncherError, LauncherResult};

/// Returned instead of an exit code when no process could be started.
pub const LAUNCH_FAILED: i32 = -1;

/// Returned when the install that precedes a first launch failed. Distinct
/// from [`LAUNCH_FAILED`]; the command line reports it as `100 + 1`.
pub const INSTALL_BEFORE_LAUNCH_FAILED: i32 = 1;

/// Run `command` in `cwd` with inherited stdio and return its exit code.
/// A process killed by a signal reports [`LAUNCH_FAILED`].
pub async fn run_command(command: &[String], cwd: &Path) -> LauncherResult<i32> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| LauncherError::Execution("empty launch command".into()))?;

    let mut cmd = tokio::process::Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    info!("Launching {} in {:?}", program, cwd);
    debug!("Command (copy/paste): {}", format_command_for_logs(command));

    let status = cmd
        .status()
        .await
        .map_err(|e| LauncherError::Execution(format!("{program}: {e}")))?;

    match status.code() {
        Some(code) => Ok(code),
        None => {
            warn!("Game process ended without an exit code ({status})");
            Ok(LAUNCH_FAILED)
        }
    }
}

fn format_command_for_logs(command: &[String]) -> String {
    command
        .iter()
        .map(|arg| shell_escape(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_quotes_only_when_needed() {
        let cmd = vec![
            "java".to_string(),
            "-Dname=a b".to_string(),
            String::new(),
            "net.minecraft.client.main.Main".to_string(),
        ];
        assert_eq!(
            format_command_for_logs(&cmd),
            r#"java "-Dname=a b" "" net.minecraft.client.main.Main"#
        );
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run_command(&[], dir.path()).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exit_code_is_passed_through() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = |script: &str| vec!["sh".to_string(), "-c".to_string(), script.to_string()];

        assert_eq!(run_command(&cmd("exit 0"), dir.path()).await.unwrap(), 0);
        assert_eq!(run_command(&cmd("exit 1"), dir.path()).await.unwrap(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_in_the_given_directory() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = vec!["sh".to_string(), "-c".to_string(), "touch marker".to_string()];
        run_command(&cmd, dir.path()).await.unwrap();
        assert!(dir.path().join("marker").exists());
    }
}
