use std::path::PathBuf;
use thiserror::Error;

use crate::core::version::UnresolvedReason;

/// Central error type for the launcher backend.
/// Every internal layer returns `Result<T, LauncherError>`; the public
/// `Instance` operations turn it into a success flag or exit code.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("No network access while trying to {0}")]
    Unreachable(String),

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Maven ───────────────────────────────────────────
    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    // ── XML / JSON ──────────────────────────────────────
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Versions ────────────────────────────────────────
    #[error("{what} version is unresolved: {reason}")]
    UnresolvedVersion {
        what: &'static str,
        reason: UnresolvedReason,
    },

    #[error("Version {0} is not installed")]
    NotInstalled(String),

    // ── Content registry ────────────────────────────────
    #[error("Content registry error: {0}")]
    Registry(String),

    // ── Loader ──────────────────────────────────────────
    #[error("Loader error: {0}")]
    Loader(String),

    #[error("Loader API unreachable: {0}")]
    LoaderApi(String),

    // ── Process ─────────────────────────────────────────
    #[error("Process execution failed: {0}")]
    Execution(String),

    // ── Persisted records ───────────────────────────────
    #[error("Instance file not found: {0:?}")]
    InstanceNotFound(PathBuf),

    #[error("Account file not found: {0:?}")]
    IdentityNotFound(PathBuf),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl LauncherError {
    /// Wraps an IO error together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }
}
