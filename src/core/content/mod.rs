pub mod manifest;
pub mod registry;
pub mod worker;

pub use manifest::{ContentManifest, ContentManifestEntry};
pub use registry::{ContentSource, CurseForgeSource};
pub use worker::{plan_shards, ContentDownloadWorker, ContentInstallReport, ItemOutcome, DEFAULT_WORKERS};
