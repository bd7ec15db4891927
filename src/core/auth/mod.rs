use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::launch::LaunchOptions;
use crate::core::paths::expand_full_path;

/// Launch identity: who the game is started as.
///
/// Only offline-style identities exist; the token is passed through opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default)]
    name: String,
    #[serde(default, rename = "username")]
    display_name: String,
    #[serde(default = "Uuid::new_v4", rename = "uuid")]
    id: Uuid,
    #[serde(default)]
    token: String,
}

impl Identity {
    /// Build an identity, generating a fresh UUID when none is supplied.
    pub fn new(name: &str, display_name: &str, id: Option<Uuid>, token: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            display_name: display_name.trim().to_string(),
            id: id.unwrap_or_else(Uuid::new_v4),
            token: token.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Credentials mapped into launch options; the executable and JVM
    /// arguments are filled in by the launch command builder.
    pub fn to_launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            username: self.display_name.clone(),
            uuid: self.id.to_string(),
            token: self.token.clone(),
            executable_path: Default::default(),
            jvm_arguments: None,
        }
    }

    pub async fn load(path: &Path) -> LauncherResult<Self> {
        let path = expand_full_path(path);
        if !path.is_file() {
            return Err(LauncherError::IdentityNotFound(path));
        }
        let json = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| LauncherError::io(&path, e))?;
        Ok(serde_json::from_str(&json)?)
    }

    pub async fn save(&self, path: &Path) -> LauncherResult<()> {
        let path = expand_full_path(path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| LauncherError::io(&path, e))
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.display_name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_uuid_when_missing() {
        let a = Identity::new("main", "Steve", None, "");
        let b = Identity::new("main", "Steve", None, "");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn persisted_record_uses_flat_keys() {
        let id = Uuid::parse_str("0f8fad5b-d9cb-469f-a165-70867728950e").unwrap();
        let identity = Identity::new("main", "Steve", Some(id), "tok");
        let value = serde_json::to_value(&identity).unwrap();

        assert_eq!(value["name"], "main");
        assert_eq!(value["username"], "Steve");
        assert_eq!(value["uuid"], "0f8fad5b-d9cb-469f-a165-70867728950e");
        assert_eq!(value["token"], "tok");

        let back: Identity = serde_json::from_value(value).unwrap();
        assert_eq!(back, identity);
    }

    #[test]
    fn record_without_uuid_gets_one() {
        let identity: Identity =
            serde_json::from_str(r#"{"name":"alt","username":"Alex","token":""}"#).unwrap();
        assert_eq!(identity.display_name(), "Alex");
        assert!(!identity.id().is_nil());
    }

    #[test]
    fn launch_options_carry_credentials() {
        let identity = Identity::new("main", "Steve", None, "secret");
        let options = identity.to_launch_options();
        assert_eq!(options.username, "Steve");
        assert_eq!(options.uuid, identity.id().to_string());
        assert_eq!(options.token, "secret");
        assert!(options.jvm_arguments.is_none());
    }

    #[tokio::test]
    async fn save_then_load_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts/steve.json");
        let identity = Identity::new("main", "Steve", None, "tok");

        identity.save(&path).await.unwrap();
        let loaded = Identity::load(&path).await.unwrap();
        assert_eq!(loaded, identity);
    }

    #[tokio::test]
    async fn load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Identity::load(&dir.path().join("nope.json")).await.unwrap_err();
        assert!(matches!(err, LauncherError::IdentityNotFound(_)));
    }
}
