//! Request-facing facade over the resource manager.

use crate::config::AppConfig;
use crate::embeddings::embed_with_dimensions;
use crate::manager::{ManagerStats, ResourceLoadError, ResourceManager};
use crate::models::{
    Candidate, EmbeddingOutput, FindingsReport, RankedResult, RedactionOutput,
    SensitivityAssessment,
};
use crate::{classifier, pii, redaction, search, sensitivity};
use providers::gazetteer::GazetteerFactory;
use providers::hashing::HashingFactory;
use providers::{
    ArtifactStore, CapabilityFactory, CapabilityRegistry, HttpFetcher, Probe, ProviderError,
    ResourceKind,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    ResourceLoad(#[from] ResourceLoadError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ServiceError {
    /// True when a capability could not be made resident.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ServiceError::ResourceLoad(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactStatus {
    pub kind: ResourceKind,
    pub path: String,
    pub present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub loaded: Option<ResourceKind>,
    pub stats: ManagerStats,
    pub artifacts: Vec<ArtifactStatus>,
}

/// Maps configured backend names onto factories.
pub fn build_registry(config: &AppConfig) -> Result<CapabilityRegistry, ProviderError> {
    let models = &config.models;
    let embedding: Arc<dyn CapabilityFactory> = match models.embedding.backend.as_str() {
        "hashing" => Arc::new(HashingFactory::new(models.embedding.artifact())),
        other => return Err(ProviderError::UnknownBackend(other.to_string())),
    };
    let recognizer: Arc<dyn CapabilityFactory> = match models.entity_recognition.backend.as_str() {
        "gazetteer" => Arc::new(GazetteerFactory::new(models.entity_recognition.artifact())),
        other => return Err(ProviderError::UnknownBackend(other.to_string())),
    };
    Ok(CapabilityRegistry::new()
        .with_factory(embedding)
        .with_factory(recognizer))
}

pub struct MlService {
    manager: ResourceManager,
    config: AppConfig,
}

impl MlService {
    pub fn new(manager: ResourceManager, config: AppConfig) -> Self {
        Self { manager, config }
    }

    /// Builds factories and the artifact store. Nothing is loaded or fetched.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let registry = build_registry(config)?;
        let store = ArtifactStore::new(&config.models.cache_dir, Arc::new(HttpFetcher::new()));
        Ok(Self::new(ResourceManager::new(registry, store), config.clone()))
    }

    pub fn manager(&self) -> &ResourceManager {
        &self.manager
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// `threshold` and `top_k` fall back to the configured search defaults.
    pub async fn search(
        &self,
        query: &str,
        candidates: &[Candidate],
        threshold: Option<f32>,
        top_k: Option<usize>,
    ) -> Result<Vec<RankedResult>, ServiceError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let threshold = threshold.unwrap_or(self.config.search.threshold);
        let top_k = top_k.unwrap_or(self.config.search.top_k);
        let model = self.manager.embedding().await?;
        Ok(search::search(&**model, query, candidates, threshold, top_k)?)
    }

    pub async fn embed(&self, text: &str) -> Result<EmbeddingOutput, ServiceError> {
        let model = self.manager.embedding().await?;
        Ok(embed_with_dimensions(&**model, text)?)
    }

    pub async fn generate_file_tags(
        &self,
        filename: &str,
        preview: Option<&str>,
    ) -> Result<Vec<String>, ServiceError> {
        let model = self.manager.embedding().await?;
        Ok(classifier::generate_file_tags(&**model, filename, preview)?)
    }

    pub async fn detect(&self, text: &str) -> Result<FindingsReport, ServiceError> {
        let recognizer = self.manager.entity_recognizer().await?;
        Ok(pii::detect(&**recognizer, text)?)
    }

    /// Detects, then redacts with `ch` or the configured redaction char.
    pub async fn redact(&self, text: &str, ch: Option<char>) -> Result<RedactionOutput, ServiceError> {
        let report = self.detect(text).await?;
        let ch = ch.unwrap_or(self.config.redaction.char);
        Ok(Self::redact_with_report(text, report, ch))
    }

    pub fn redact_with_report(text: &str, report: FindingsReport, ch: char) -> RedactionOutput {
        RedactionOutput {
            original_length: text.chars().count(),
            redacted_text: redaction::redact(text, &report, ch),
            findings: report,
        }
    }

    pub async fn assess_sensitivity(&self, text: &str) -> Result<SensitivityAssessment, ServiceError> {
        let report = self.detect(text).await?;
        Ok(sensitivity::assess_sensitivity(&report))
    }

    /// Readiness snapshot. Never loads or fetches anything.
    pub async fn status(&self) -> ServiceStatus {
        ServiceStatus {
            loaded: self.manager.loaded_kind().await,
            stats: self.manager.stats(),
            artifacts: self.artifact_statuses(),
        }
    }

    /// Fetches every registered artifact that is not cached yet.
    pub async fn fetch_models(&self) -> Result<Vec<ArtifactStatus>, ServiceError> {
        let store = self.manager.store();
        for kind in self.manager.registry().kinds() {
            let factory = self.manager.registry().factory(kind)?;
            match store.probe(factory.artifact()) {
                Probe::Found(path) => {
                    info!(kind = %kind, path = %path.display(), "Artifact already cached")
                }
                Probe::Missing(_) => {
                    store.fetch(factory.artifact()).await?;
                }
            }
        }
        Ok(self.artifact_statuses())
    }

    pub async fn shutdown(&self) {
        self.manager.cleanup().await;
    }

    fn artifact_statuses(&self) -> Vec<ArtifactStatus> {
        let registry = self.manager.registry();
        let store = self.manager.store();
        registry
            .kinds()
            .into_iter()
            .filter_map(|kind| {
                let factory = registry.factory(kind).ok()?;
                let (path, present) = match store.probe(factory.artifact()) {
                    Probe::Found(p) => (p, true),
                    Probe::Missing(p) => (p, false),
                };
                Some(ArtifactStatus {
                    kind,
                    path: path.display().to_string(),
                    present,
                })
            })
            .collect()
    }
}
