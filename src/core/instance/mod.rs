mod lifecycle;
pub mod model;
pub mod orchestrator;

pub use model::{Instance, InstanceSpec, LoaderType};
pub use orchestrator::InstallOrchestrator;
