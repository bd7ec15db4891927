// ─── Version Resolver ───
// Turns user hints into concrete (base, loader) versions, degrading to an
// explicit "unresolved" slot instead of failing. Failures surface later, when
// install or launch needs a concrete version.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::instance::LoaderType;
use crate::core::network::Reachability;

/// Why a version slot holds no concrete version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// A lookup was needed but the network was unreachable.
    Offline,
    /// Verification rejected the requested version.
    Rejected { hint: String },
    /// No loader build exists for the base version.
    NoCompatibleLoader { base: String },
    /// The loader version depends on a base version that is itself unresolved.
    BaseUnresolved,
    /// The instance has no loader.
    NotApplicable,
    /// The remote lookup failed.
    LookupFailed { message: String },
    /// Read back from a record that only stored the legacy `"Invalid"` marker.
    Persisted,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::Offline => write!(f, "no network access during resolution"),
            UnresolvedReason::Rejected { hint } => write!(f, "{hint} failed verification"),
            UnresolvedReason::NoCompatibleLoader { base } => {
                write!(f, "no compatible loader build for {base}")
            }
            UnresolvedReason::BaseUnresolved => write!(f, "base version is unresolved"),
            UnresolvedReason::NotApplicable => write!(f, "instance has no loader"),
            UnresolvedReason::LookupFailed { message } => write!(f, "lookup failed: {message}"),
            UnresolvedReason::Persisted => write!(f, "stored as Invalid"),
        }
    }
}

/// A version that is either concrete or carries the reason it is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SlotRepr", into = "SlotRepr")]
pub enum VersionSlot {
    Resolved(String),
    Unresolved(UnresolvedReason),
}

/// On-disk shape: plain string, or `{"unresolved": {...}}`.
/// The legacy `"Invalid"` marker and empty strings read back as unresolved.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SlotRepr {
    Plain(String),
    Unresolved { unresolved: UnresolvedReason },
}

pub const INVALID_MARKER: &str = "Invalid";

impl From<SlotRepr> for VersionSlot {
    fn from(repr: SlotRepr) -> Self {
        match repr {
            SlotRepr::Plain(v) if v.trim().is_empty() || v == INVALID_MARKER => {
                VersionSlot::Unresolved(UnresolvedReason::Persisted)
            }
            SlotRepr::Plain(v) => VersionSlot::Resolved(v),
            SlotRepr::Unresolved { unresolved } => VersionSlot::Unresolved(unresolved),
        }
    }
}

impl From<VersionSlot> for SlotRepr {
    fn from(slot: VersionSlot) -> Self {
        match slot {
            VersionSlot::Resolved(v) => SlotRepr::Plain(v),
            VersionSlot::Unresolved(unresolved) => SlotRepr::Unresolved { unresolved },
        }
    }
}

impl VersionSlot {
    pub fn as_resolved(&self) -> Option<&str> {
        match self {
            VersionSlot::Resolved(v) => Some(v),
            VersionSlot::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, VersionSlot::Resolved(_))
    }

    /// The concrete version, or an error naming `what` and the reason.
    pub fn require(&self, what: &'static str) -> LauncherResult<&str> {
        match self {
            VersionSlot::Resolved(v) => Ok(v),
            VersionSlot::Unresolved(reason) => Err(LauncherError::UnresolvedVersion {
                what,
                reason: reason.clone(),
            }),
        }
    }
}

impl fmt::Display for VersionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSlot::Resolved(v) => f.write_str(v),
            VersionSlot::Unresolved(_) => f.write_str(INVALID_MARKER),
        }
    }
}

/// Remote version metadata: the "latest" and "is valid" queries for the base
/// game and for each loader.
#[async_trait]
pub trait VersionSource: Send + Sync {
    async fn latest_release(&self) -> LauncherResult<String>;

    async fn is_release(&self, version: &str) -> LauncherResult<bool>;

    /// Newest loader build compatible with `base`, if any.
    async fn latest_loader(&self, loader: LoaderType, base: &str) -> LauncherResult<Option<String>>;

    async fn is_loader_valid(
        &self,
        loader: LoaderType,
        base: &str,
        loader_version: &str,
    ) -> LauncherResult<bool>;
}

/// User-supplied hints; empty strings mean "pick the latest".
#[derive(Debug, Clone, Default)]
pub struct VersionHints {
    pub base: String,
    pub loader: LoaderType,
    pub loader_version: String,
    pub verify_base: bool,
    pub verify_loader: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersions {
    pub base: VersionSlot,
    pub loader_version: VersionSlot,
}

pub struct VersionResolver<'a> {
    reachability: &'a dyn Reachability,
    source: &'a dyn VersionSource,
    online: OnceCell<bool>,
}

impl<'a> VersionResolver<'a> {
    pub fn new(reachability: &'a dyn Reachability, source: &'a dyn VersionSource) -> Self {
        Self {
            reachability,
            source,
            online: OnceCell::new(),
        }
    }

    /// Probed at most once per resolver.
    async fn online(&self) -> bool {
        *self
            .online
            .get_or_init(|| self.reachability.is_reachable())
            .await
    }

    pub async fn resolve(&self, hints: &VersionHints) -> ResolvedVersions {
        let base = self.resolve_base(&hints.base, hints.verify_base).await;
        let loader_version = self
            .resolve_loader(hints.loader, &base, &hints.loader_version, hints.verify_loader)
            .await;
        ResolvedVersions {
            base,
            loader_version,
        }
    }

    pub async fn resolve_base(&self, hint: &str, verify: bool) -> VersionSlot {
        let hint = hint.trim();

        if hint.is_empty() {
            if !self.online().await {
                warn!("No network access while looking up the latest Minecraft release; base version set to {INVALID_MARKER}");
                return VersionSlot::Unresolved(UnresolvedReason::Offline);
            }
            return match self.source.latest_release().await {
                Ok(latest) => {
                    info!("Using latest Minecraft release {latest}");
                    VersionSlot::Resolved(latest)
                }
                Err(e) => {
                    warn!("Could not look up the latest Minecraft release: {e}");
                    VersionSlot::Unresolved(UnresolvedReason::LookupFailed {
                        message: e.to_string(),
                    })
                }
            };
        }

        if !verify {
            return VersionSlot::Resolved(hint.to_string());
        }

        info!("Verifying Minecraft version {hint}...");
        if !self.online().await {
            warn!("No network access while verifying Minecraft version {hint}; assuming it is correct");
            return VersionSlot::Resolved(hint.to_string());
        }

        match self.source.is_release(hint).await {
            Ok(true) => VersionSlot::Resolved(hint.to_string()),
            Ok(false) => {
                warn!("Minecraft version {hint} is invalid; base version set to {INVALID_MARKER}");
                VersionSlot::Unresolved(UnresolvedReason::Rejected {
                    hint: hint.to_string(),
                })
            }
            Err(e) => {
                warn!("Could not verify Minecraft version {hint} ({e}); assuming it is correct");
                VersionSlot::Resolved(hint.to_string())
            }
        }
    }

    pub async fn resolve_loader(
        &self,
        loader: LoaderType,
        base: &VersionSlot,
        hint: &str,
        verify: bool,
    ) -> VersionSlot {
        if loader == LoaderType::Vanilla {
            return VersionSlot::Unresolved(UnresolvedReason::NotApplicable);
        }

        let hint = hint.trim();

        if !hint.is_empty() {
            if !verify {
                return VersionSlot::Resolved(hint.to_string());
            }
            info!("Verifying {loader} version {hint}...");
            if !self.online().await {
                warn!("No network access while verifying {loader} version {hint}; assuming it is correct");
                return VersionSlot::Resolved(hint.to_string());
            }
        }

        let Some(base) = base.as_resolved() else {
            warn!("Cannot resolve {loader} version without a base version; set to {INVALID_MARKER}");
            return VersionSlot::Unresolved(UnresolvedReason::BaseUnresolved);
        };

        if hint.is_empty() {
            if !self.online().await {
                warn!("No network access while looking up the latest {loader} version; set to {INVALID_MARKER}");
                return VersionSlot::Unresolved(UnresolvedReason::Offline);
            }
            return match self.source.latest_loader(loader, base).await {
                Ok(Some(latest)) => {
                    info!("Using latest {loader} version {latest} for Minecraft {base}");
                    VersionSlot::Resolved(latest)
                }
                Ok(None) => {
                    warn!("No {loader} version found for Minecraft {base}; set to {INVALID_MARKER}");
                    VersionSlot::Unresolved(UnresolvedReason::NoCompatibleLoader {
                        base: base.to_string(),
                    })
                }
                Err(e) => {
                    warn!("Could not look up the latest {loader} version: {e}");
                    VersionSlot::Unresolved(UnresolvedReason::LookupFailed {
                        message: e.to_string(),
                    })
                }
            };
        }

        match self.source.is_loader_valid(loader, base, hint).await {
            Ok(true) => VersionSlot::Resolved(hint.to_string()),
            Ok(false) => {
                warn!("{loader} version {hint} is invalid for Minecraft {base}; set to {INVALID_MARKER}");
                VersionSlot::Unresolved(UnresolvedReason::Rejected {
                    hint: hint.to_string(),
                })
            }
            Err(e) => {
                warn!("Could not verify {loader} version {hint} ({e}); assuming it is correct");
                VersionSlot::Resolved(hint.to_string())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// In-memory catalog: a list of releases and, per loader, the builds
    /// available for each base version (newest first).
    #[derive(Default)]
    pub struct FakeVersionSource {
        pub latest: String,
        pub releases: Vec<String>,
        pub fabric: Vec<(String, Vec<String>)>,
        pub forge: Vec<(String, Vec<String>)>,
        pub fail: bool,
        pub calls: AtomicUsize,
    }

    impl FakeVersionSource {
        pub fn standard() -> Self {
            Self {
                latest: "1.20.4".into(),
                releases: vec!["1.20.1".into(), "1.20.4".into()],
                fabric: vec![("1.20.1".into(), vec!["0.15.7".into(), "0.14.21".into()])],
                forge: vec![("1.20.1".into(), vec!["1.20.1-47.2.0".into()])],
                ..Default::default()
            }
        }

        fn builds(&self, loader: LoaderType, base: &str) -> Vec<String> {
            let table = match loader {
                LoaderType::Fabric => &self.fabric,
                LoaderType::Forge => &self.forge,
                LoaderType::Vanilla => return vec![],
            };
            table
                .iter()
                .find(|(b, _)| b == base)
                .map(|(_, builds)| builds.clone())
                .unwrap_or_default()
        }

        fn check(&self) -> LauncherResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LauncherError::Other("catalog down".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl VersionSource for FakeVersionSource {
        async fn latest_release(&self) -> LauncherResult<String> {
            self.check()?;
            Ok(self.latest.clone())
        }

        async fn is_release(&self, version: &str) -> LauncherResult<bool> {
            self.check()?;
            Ok(self.releases.iter().any(|r| r == version))
        }

        async fn latest_loader(&self, loader: LoaderType, base: &str) -> LauncherResult<Option<String>> {
            self.check()?;
            Ok(self.builds(loader, base).into_iter().next())
        }

        async fn is_loader_valid(
            &self,
            loader: LoaderType,
            base: &str,
            loader_version: &str,
        ) -> LauncherResult<bool> {
            self.check()?;
            Ok(self.builds(loader, base).iter().any(|b| b == loader_version))
        }
    }
}
