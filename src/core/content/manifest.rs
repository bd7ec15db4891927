use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::paths::expand_full_path;

/// One `{projectID, fileID}` pair from a pack manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContentManifestEntry {
    #[serde(rename = "projectID", deserialize_with = "id_as_string")]
    project_id: String,
    #[serde(rename = "fileID", deserialize_with = "id_as_string")]
    file_id: String,
}

impl ContentManifestEntry {
    pub fn new(project_id: impl Into<String>, file_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            file_id: file_id.into(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }
}

impl std::fmt::Display for ContentManifestEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.project_id, self.file_id)
    }
}

/// Pack manifest; only the `files` list is read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentManifest {
    #[serde(default)]
    pub files: Vec<ContentManifestEntry>,
}

impl ContentManifest {
    pub async fn load(path: &Path) -> LauncherResult<Self> {
        let path = expand_full_path(path);
        let json = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| LauncherError::io(&path, e))?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Registry ids show up both as JSON numbers and as strings.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_and_string_ids_ignoring_extra_fields() {
        let manifest: ContentManifest = serde_json::from_str(
            r#"{
                "minecraft": {"version": "1.20.1"},
                "name": "Pack",
                "files": [
                    {"projectID": 238222, "fileID": 4712866, "required": true},
                    {"projectID": "2", "fileID": "20"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(
            manifest.files,
            vec![
                ContentManifestEntry::new("238222", "4712866"),
                ContentManifestEntry::new("2", "20"),
            ]
        );
    }

    #[test]
    fn missing_files_list_is_empty() {
        let manifest: ContentManifest = serde_json::from_str("{}").unwrap();
        assert!(manifest.files.is_empty());
    }

    #[tokio::test]
    async fn load_reports_missing_file_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = ContentManifest::load(&dir.path().join("manifest.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::Io { .. }));
    }
}
