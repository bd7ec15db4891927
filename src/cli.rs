//! CLI argument parsing with clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use crate::core::instance::LoaderType;

/// Install, update and launch Minecraft instances
#[derive(Parser)]
#[command(
    name = "blocklaunch",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Content registry API key
    #[arg(long, global = true, env = "CURSEFORGE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Concurrent content download workers
    #[arg(long, global = true, value_name = "N")]
    pub workers: Option<usize>,

    /// Behave as if the network were unreachable
    #[arg(long, global = true)]
    pub offline: bool,

    /// Launcher settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage instances
    #[command(subcommand)]
    Instance(InstanceCommand),

    /// Manage launch identities
    #[command(subcommand)]
    Account(AccountCommand),

    /// Show or change launcher settings
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Subcommand)]
pub enum InstanceCommand {
    /// Create an instance file, resolving versions
    Create(CreateArgs),

    /// Print an instance file
    Show(InstanceFile),

    /// Install the game, loader and content
    Install(InstanceFile),

    /// Install the game and loader only
    InstallBase(InstanceFile),

    /// Install the content manifest only
    InstallContent(InstanceFile),

    /// Install one registry item
    InstallItem(InstallItemArgs),

    /// Move to the latest game (vanilla) or loader version
    Update(UpdateArgs),

    /// Move to the latest game version
    UpdateBase(UpdateArgs),

    /// Move to the latest loader version
    UpdateLoader(UpdateArgs),

    /// Launch the game
    Run(RunArgs),
}

#[derive(Args)]
pub struct InstanceFile {
    /// Instance file
    pub file: PathBuf,
}

#[derive(Args)]
pub struct CreateArgs {
    /// Where to write the instance file
    pub out: PathBuf,

    #[arg(long, default_value = "minecraft")]
    pub name: String,

    /// Game directory (defaults to the platform's .minecraft)
    #[arg(long, value_name = "DIR")]
    pub root_dir: Option<PathBuf>,

    /// Game version; empty picks the latest release
    #[arg(long, default_value = "")]
    pub base_version: String,

    #[arg(long, value_enum, default_value_t = LoaderType::Vanilla)]
    pub loader: LoaderType,

    /// Loader version; empty picks the latest compatible build
    #[arg(long, default_value = "")]
    pub loader_version: String,

    /// Java executable
    #[arg(long, value_name = "PATH")]
    pub java: Option<PathBuf>,

    /// JVM arguments, whitespace separated
    #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
    pub jvm_args: Option<String>,

    /// Content manifest to install from
    #[arg(long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    #[arg(long)]
    pub no_verify_base: bool,

    #[arg(long)]
    pub no_verify_loader: bool,

    #[arg(long)]
    pub no_verify_launch: bool,
}

#[derive(Args)]
pub struct InstallItemArgs {
    /// Instance file
    pub file: PathBuf,
    pub project_id: String,
    pub file_id: String,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Instance file
    pub file: PathBuf,

    /// Save to this path instead of the instance file
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Update in memory only
    #[arg(long)]
    pub no_save: bool,
}

#[derive(Args)]
pub struct RunArgs {
    /// Instance file
    pub file: PathBuf,

    #[command(flatten)]
    pub identity: IdentityArgs,

    /// Java executable for this launch
    #[arg(long, value_name = "PATH")]
    pub java: Option<PathBuf>,

    /// JVM arguments for this launch, whitespace separated
    #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
    pub jvm_args: Option<String>,

    /// Launch even if the version is not installed
    #[arg(long)]
    pub no_verify_launch: bool,
}

#[derive(Args)]
pub struct IdentityArgs {
    /// Account file
    #[arg(long, value_name = "FILE", conflicts_with = "username")]
    pub account: Option<PathBuf>,

    /// In-game name for an ad-hoc identity
    #[arg(long)]
    pub username: Option<String>,

    #[arg(long, requires = "username")]
    pub account_name: Option<String>,

    #[arg(long, requires = "username")]
    pub uuid: Option<Uuid>,

    #[arg(long, requires = "username")]
    pub token: Option<String>,
}

#[derive(Subcommand)]
pub enum AccountCommand {
    /// Write an account file
    Create {
        /// Where to write the account file
        out: PathBuf,
        #[arg(long)]
        username: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        uuid: Option<Uuid>,
        #[arg(long, default_value = "")]
        token: String,
    },

    /// Print an account file
    Show {
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Print the effective settings
    Show,

    /// Store the registry API key
    SetApiKey { key: String },
}

/// Split a whitespace-separated argument string.
pub fn split_args(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}
