use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};

use super::manifest::ContentManifestEntry;

/// Progress is logged once per this many bytes written.
pub const DOWNLOAD_CHUNK_SIZE: u64 = 2 * 1024 * 1024;

/// Where content packages come from: id → URL lookup, then the bytes.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn resolve_download_url(&self, entry: &ContentManifestEntry) -> LauncherResult<String>;

    /// Stream `url` into `dest`; returns the number of bytes written.
    async fn download(&self, url: &str, dest: &Path) -> LauncherResult<u64>;
}

#[derive(Debug, Deserialize)]
struct DownloadUrlResponse {
    data: Option<String>,
}

/// CurseForge-compatible registry client.
pub struct CurseForgeSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    download_timeout: Duration,
}

impl CurseForgeSource {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        api_key: &str,
        download_timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            download_timeout,
        }
    }

    fn download_url_endpoint(&self, entry: &ContentManifestEntry) -> String {
        format!(
            "{}/v1/mods/{}/files/{}/download-url",
            self.base_url,
            entry.project_id(),
            entry.file_id()
        )
    }
}

#[async_trait]
impl ContentSource for CurseForgeSource {
    async fn resolve_download_url(&self, entry: &ContentManifestEntry) -> LauncherResult<String> {
        let resp = self
            .client
            .get(self.download_url_endpoint(entry))
            .header(ACCEPT, "application/json")
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(LauncherError::Registry(format!(
                "{} returned HTTP {}",
                entry,
                resp.status()
            )));
        }

        let body: DownloadUrlResponse = resp.json().await?;
        body.data
            .filter(|url| !url.is_empty())
            .ok_or_else(|| LauncherError::Registry(format!("no download URL for {}", entry)))
    }

    async fn download(&self, url: &str, dest: &Path) -> LauncherResult<u64> {
        let resp = self
            .client
            .get(url)
            .timeout(self.download_timeout)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        let total = resp.content_length();
        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| LauncherError::io(dest, e))?;
        let mut written: u64 = 0;
        let mut next_report: u64 = 0;
        let mut body = resp.bytes_stream();

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            if written >= next_report {
                match total {
                    Some(total) => info!("Saving chunk {}/{} of {}", written, total, url),
                    None => info!("Saving chunk {} of {}", written, url),
                }
                next_report += DOWNLOAD_CHUNK_SIZE;
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| LauncherError::io(dest, e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| LauncherError::io(dest, e))?;

        debug!("Wrote {} bytes to {}", written, name);
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_follows_registry_layout() {
        let source = CurseForgeSource::new(
            reqwest::Client::new(),
            "https://api.curseforge.com/",
            "key",
            Duration::from_secs(1),
        );
        assert_eq!(
            source.download_url_endpoint(&ContentManifestEntry::new("238222", "4712866")),
            "https://api.curseforge.com/v1/mods/238222/files/4712866/download-url"
        );
    }

    #[test]
    fn null_data_deserializes_to_none() {
        let body: DownloadUrlResponse = serde_json::from_str(r#"{"data": null}"#).unwrap();
        assert!(body.data.is_none());
        let body: DownloadUrlResponse =
            serde_json::from_str(r#"{"data": "https://edge.forgecdn.net/files/1/2/a.jar"}"#)
                .unwrap();
        assert_eq!(body.data.as_deref(), Some("https://edge.forgecdn.net/files/1/2/a.jar"));
    }
}
