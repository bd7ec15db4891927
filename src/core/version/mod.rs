pub mod catalog;
pub mod manifest;
pub mod resolver;
pub mod version_file;

pub use catalog::MetaVersionSource;
pub use manifest::{VersionEntry, VersionManifest};
pub use resolver::{
    ResolvedVersions, UnresolvedReason, VersionHints, VersionResolver, VersionSlot, VersionSource,
};
pub use version_file::{
    installed_versions, version_jar_path, version_json_path, AssetIndexInfo, LibraryEntry,
    VersionJson,
};
