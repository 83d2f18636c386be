use log::{debug, info, warn};
use reqwest::header::CACHE_CONTROL;
use reqwest::Client;
use std::fmt;
use std::path::PathBuf;

use crate::error::{CatalogError, CatalogResult};
use crate::manifest::Manifest;

/// Where a manifest document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    Url(String),
    File(PathBuf),
    Inline(String),
    Embedded,
}

impl ManifestSource {
    /// Interpret a command-line or config value: `embedded`, an http(s) URL,
    /// an inline JSON object, or otherwise a file path.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("embedded") {
            ManifestSource::Embedded
        } else if value.starts_with("http://") || value.starts_with("https://") {
            ManifestSource::Url(value.to_string())
        } else if value.starts_with('{') {
            ManifestSource::Inline(value.to_string())
        } else {
            ManifestSource::File(PathBuf::from(value))
        }
    }
}

impl fmt::Display for ManifestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestSource::Url(url) => write!(f, "{}", url),
            ManifestSource::File(path) => write!(f, "{}", path.display()),
            ManifestSource::Inline(_) => f.write_str("inline manifest"),
            ManifestSource::Embedded => f.write_str("embedded manifest"),
        }
    }
}

/// Loads the manifest once at startup, trying the fallback source when the
/// primary one can't be read or parsed.
pub struct ManifestLoader {
    client: Client,
    primary: ManifestSource,
    fallback: Option<ManifestSource>,
}

impl ManifestLoader {
    pub fn new(primary: ManifestSource) -> Self {
        Self {
            client: Client::new(),
            primary,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: ManifestSource) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn primary(&self) -> &ManifestSource {
        &self.primary
    }

    pub fn fallback(&self) -> Option<&ManifestSource> {
        self.fallback.as_ref()
    }

    /// Fails with `ManifestUnavailable` only when every source failed.
    pub async fn load(&self) -> CatalogResult<Manifest> {
        let mut reasons = Vec::new();

        let sources = std::iter::once(&self.primary).chain(self.fallback.as_ref());
        for source in sources {
            debug!("loading manifest from {}", source);
            match self.fetch(source).await {
                Ok(manifest) => {
                    info!(
                        "manifest loaded from {}: {} cycles, {} variables, {} regions, {} hours",
                        source,
                        manifest.cycles().len(),
                        manifest.variables().len(),
                        manifest.regions().len(),
                        manifest.hours().len()
                    );
                    return Ok(manifest);
                }
                Err(e) => {
                    warn!("manifest source {} failed: {}", source, e);
                    reasons.push(format!("{}: {}", source, e));
                }
            }
        }

        Err(CatalogError::ManifestUnavailable { reasons })
    }

    async fn fetch(&self, source: &ManifestSource) -> CatalogResult<Manifest> {
        match source {
            ManifestSource::Url(url) => {
                let response = self
                    .client
                    .get(url)
                    .header(CACHE_CONTROL, "no-cache")
                    .send()
                    .await?
                    .error_for_status()?;
                let text = response.text().await?;
                Manifest::from_json(&text)
            }
            ManifestSource::File(path) => {
                let text = tokio::fs::read_to_string(path).await?;
                Manifest::from_json(&text)
            }
            ManifestSource::Inline(text) => Manifest::from_json(text),
            ManifestSource::Embedded => Manifest::embedded(),
        }
    }
}
