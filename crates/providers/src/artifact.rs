//! Local artifact cache with an explicit network fetch step.

use crate::ProviderError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Where a model artifact lives in the cache and where to download it from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSpec {
    pub name: String,
    /// Path relative to the cache root.
    pub file: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Hex blake3 digest of the artifact, verified after fetching.
    #[serde(default)]
    pub checksum: Option<String>,
}

/// Result of looking for an artifact in the local cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Found(PathBuf),
    /// Not cached; carries the path a fetch would write to.
    Missing(PathBuf),
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ProviderError>;
}

#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ProviderError::RequestFailed(format!(
                "status {} fetching {}",
                resp.status(),
                url
            )));
        }
        let body = resp
            .bytes()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        Ok(body.to_vec())
    }
}

#[derive(Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    fetcher: Arc<dyn Fetcher>,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            root: root.into(),
            fetcher,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, spec: &ArtifactSpec) -> PathBuf {
        self.root.join(&spec.file)
    }

    pub fn probe(&self, spec: &ArtifactSpec) -> Probe {
        let path = self.path_for(spec);
        if path.is_file() {
            Probe::Found(path)
        } else {
            Probe::Missing(path)
        }
    }

    /// Downloads the artifact into the cache. Not retried; the caller decides.
    ///
    /// The payload is written to a `.part` sibling first and renamed into
    /// place, so a failed fetch never leaves a truncated artifact behind.
    pub async fn fetch(&self, spec: &ArtifactSpec) -> Result<PathBuf, ProviderError> {
        let url = spec
            .url
            .as_deref()
            .ok_or_else(|| ProviderError::ArtifactMissing(spec.name.clone()))?;
        let dest = self.path_for(spec);
        info!(artifact = %spec.name, url, "Fetching artifact...");

        let bytes = self.fetcher.fetch(url).await?;
        if let Some(expected) = &spec.checksum {
            let actual = blake3::hash(&bytes).to_hex().to_string();
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(ProviderError::ChecksumMismatch {
                    name: spec.name.clone(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut partial = dest.clone().into_os_string();
        partial.push(".part");
        let partial = PathBuf::from(partial);
        let stored = match tokio::fs::write(&partial, &bytes).await {
            Ok(()) => tokio::fs::rename(&partial, &dest).await,
            Err(e) => Err(e),
        };
        if let Err(e) = stored {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }
        debug!(path = %dest.display(), bytes = bytes.len(), "Artifact stored");
        Ok(dest)
    }

    /// Probe, then fetch on a miss.
    pub async fn resolve(&self, spec: &ArtifactSpec) -> Result<PathBuf, ProviderError> {
        match self.probe(spec) {
            Probe::Found(path) => Ok(path),
            Probe::Missing(_) => self.fetch(spec).await,
        }
    }
}
