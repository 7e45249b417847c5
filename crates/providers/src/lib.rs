//! Capability abstractions for heavyweight inference models.
//!
//! A capability is an opaque, ready-to-use model instance. Factories build
//! them from a resolved local artifact; the artifact store resolves (and if
//! needed fetches) that artifact.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub mod artifact;
pub mod gazetteer;
pub mod hashing;
pub mod text;

pub use artifact::{ArtifactSpec, ArtifactStore, Fetcher, HttpFetcher, Probe};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("artifact {0} is not available locally and has no download url")]
    ArtifactMissing(String),
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("checksum mismatch for {name}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },
    #[error("invalid artifact {path}: {reason}")]
    InvalidArtifact { path: String, reason: String },
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("no factory registered for {0}")]
    UnknownKind(ResourceKind),
    #[error("factory for {expected} produced a {actual} capability")]
    KindMismatch {
        expected: ResourceKind,
        actual: ResourceKind,
    },
    #[error("load aborted: {0}")]
    LoadAborted(String),
    #[error("unknown backend: {0}")]
    UnknownBackend(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Identifier for a heavyweight inference capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Embedding,
    EntityRecognition,
}

impl ResourceKind {
    pub fn all() -> &'static [ResourceKind] {
        &[ResourceKind::Embedding, ResourceKind::EntityRecognition]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Embedding => "embedding",
            ResourceKind::EntityRecognition => "entity_recognition",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labelled span reported by an entity recognizer.
///
/// `start`/`end` are character offsets into the processed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub label: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

pub trait EmbeddingCapability: Send + Sync {
    /// Deterministic for identical input.
    fn encode(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    fn dimensions(&self) -> usize;

    /// Approximate resident size, used for unload logging.
    fn footprint_bytes(&self) -> usize {
        0
    }

    /// Called right before the instance is dropped. Backends holding
    /// accelerator memory clear their device caches here.
    fn release(&mut self) {}
}

pub trait EntityRecognitionCapability: Send + Sync {
    fn process(&self, text: &str) -> Result<Vec<EntitySpan>, ProviderError>;

    fn footprint_bytes(&self) -> usize {
        0
    }

    fn release(&mut self) {}
}

/// A loaded capability instance of either kind.
pub enum Capability {
    Embedding(Box<dyn EmbeddingCapability>),
    EntityRecognition(Box<dyn EntityRecognitionCapability>),
}

impl Capability {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Capability::Embedding(_) => ResourceKind::Embedding,
            Capability::EntityRecognition(_) => ResourceKind::EntityRecognition,
        }
    }

    pub fn footprint_bytes(&self) -> usize {
        match self {
            Capability::Embedding(m) => m.footprint_bytes(),
            Capability::EntityRecognition(m) => m.footprint_bytes(),
        }
    }

    pub fn release(&mut self) {
        match self {
            Capability::Embedding(m) => m.release(),
            Capability::EntityRecognition(m) => m.release(),
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

/// Builds one kind of capability.
///
/// Constructing the factory is the cheap phase (no I/O); `load` is the heavy
/// phase and runs on a blocking thread.
pub trait CapabilityFactory: Send + Sync {
    fn kind(&self) -> ResourceKind;

    fn artifact(&self) -> &ArtifactSpec;

    fn load(&self, artifact: &Path) -> Result<Capability, ProviderError>;
}

#[derive(Default, Clone)]
pub struct CapabilityRegistry {
    factories: HashMap<ResourceKind, Arc<dyn CapabilityFactory>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_factory(mut self, factory: Arc<dyn CapabilityFactory>) -> Self {
        self.factories.insert(factory.kind(), factory);
        self
    }

    pub fn factory(&self, kind: ResourceKind) -> Result<Arc<dyn CapabilityFactory>, ProviderError> {
        self.factories
            .get(&kind)
            .cloned()
            .ok_or(ProviderError::UnknownKind(kind))
    }

    pub fn kinds(&self) -> Vec<ResourceKind> {
        ResourceKind::all()
            .iter()
            .copied()
            .filter(|k| self.factories.contains_key(k))
            .collect()
    }
}
