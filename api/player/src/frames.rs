use anyhow::{anyhow, Context, Result};
use log::debug;
use reqwest::Client;
use std::path::{Path, PathBuf};

/// Loads frame images for a locator: over HTTP for absolute URLs, from disk
/// (relative to `root`) otherwise. One attempt per call, no retries.
#[derive(Clone)]
pub struct FrameFetcher {
    client: Client,
    root: PathBuf,
}

impl FrameFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            client: Client::new(),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_remote(locator: &str) -> bool {
        locator.starts_with("http://") || locator.starts_with("https://")
    }

    pub async fn fetch(&self, locator: &str) -> Result<Vec<u8>> {
        if Self::is_remote(locator) {
            debug!("fetching frame {}", locator);
            let response = self.client.get(locator).send().await?;
            if !response.status().is_success() {
                return Err(anyhow!(
                    "frame request failed: {} - URL: {}",
                    response.status(),
                    locator
                ));
            }
            let bytes = response.bytes().await?;
            Ok(bytes.to_vec())
        } else {
            let path = self.root.join(locator);
            debug!("reading frame {}", path.display());
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("frame not readable: {}", path.display()))?;
            Ok(bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tells_remote_from_local() {
        assert!(FrameFetcher::is_remote("https://example.org/a/000h.png"));
        assert!(!FrameFetcher::is_remote("assets/20250126_00Z/plataforma/storm_surge/000h.png"));
    }

    #[tokio::test]
    async fn reads_frames_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        let frame_dir = dir.path().join("assets/20250126_00Z/plataforma/storm_surge");
        std::fs::create_dir_all(&frame_dir).unwrap();
        std::fs::write(frame_dir.join("000h.png"), b"\x89PNG").unwrap();

        let fetcher = FrameFetcher::new(dir.path());
        let bytes = fetcher
            .fetch("assets/20250126_00Z/plataforma/storm_surge/000h.png")
            .await
            .unwrap();
        assert_eq!(bytes, b"\x89PNG");
    }

    #[tokio::test]
    async fn missing_frame_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FrameFetcher::new(dir.path());
        let err = fetcher
            .fetch("assets/20250126_00Z/plataforma/storm_surge/003h.png")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("frame not readable"));
    }
}
