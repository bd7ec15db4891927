pub mod builder;
pub mod synth;
pub mod task;

use std::path::PathBuf;

pub use builder::{effective_version, LaunchCommandBuilder, LaunchOverrides};
pub use synth::{CommandSynthesizer, VersionJsonSynthesizer};
pub use task::{run_command, INSTALL_BEFORE_LAUNCH_FAILED, LAUNCH_FAILED};

/// Everything the command synthesizer needs besides the version and root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    pub username: String,
    pub uuid: String,
    pub token: String,
    pub executable_path: PathBuf,
    /// Only set when the user supplied at least one argument.
    pub jvm_arguments: Option<Vec<String>>,
}
