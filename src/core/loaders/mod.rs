pub mod context;
pub mod fabric;
pub mod forge;
pub mod installer;
pub mod vanilla;

pub use context::InstallContext;
pub use installer::{
    InstallProgress, InstallRequest, Installer, LoaderInstaller, LogProgressSink, ProgressSink,
    RuntimeInstaller,
};
