#![allow(dead_code)]

use async_trait::async_trait;
use ml_core::config::AppConfig;
use ml_core::{MlService, ResourceManager};
use providers::text::CharIndex;
use providers::{
    ArtifactSpec, ArtifactStore, Capability, CapabilityFactory, CapabilityRegistry,
    EmbeddingCapability, EntityRecognitionCapability, EntitySpan, Fetcher, ProviderError,
    ResourceKind,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

pub const DIMS: usize = 3;

/// Looks texts up in a fixed table; unknown text maps to the zero vector and
/// the text "boom" fails.
pub struct FakeEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    live: Arc<AtomicUsize>,
}

impl FakeEmbedder {
    pub fn new(vectors: HashMap<String, Vec<f32>>, live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self { vectors, live }
    }
}

impl Drop for FakeEmbedder {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl EmbeddingCapability for FakeEmbedder {
    fn encode(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        if text == "boom" {
            return Err(ProviderError::Inference("boom".into()));
        }
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![0.0; DIMS]))
    }

    fn dimensions(&self) -> usize {
        DIMS
    }
}

/// Reports every exact occurrence of each configured phrase.
pub struct FakeRecognizer {
    phrases: Vec<(String, String)>,
}

impl EntityRecognitionCapability for FakeRecognizer {
    fn process(&self, text: &str) -> Result<Vec<EntitySpan>, ProviderError> {
        let index = CharIndex::new(text);
        let mut spans = Vec::new();
        for (label, phrase) in &self.phrases {
            for (start, hit) in text.match_indices(phrase.as_str()) {
                spans.push(EntitySpan {
                    label: label.clone(),
                    text: hit.to_string(),
                    start: index.char_offset(start),
                    end: index.char_offset(start + hit.len()),
                });
            }
        }
        Ok(spans)
    }
}

type Build = Box<dyn Fn() -> Capability + Send + Sync>;

pub struct CountingFactory {
    kind: ResourceKind,
    artifact: ArtifactSpec,
    loads: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
    build: Build,
}

impl CapabilityFactory for CountingFactory {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn artifact(&self) -> &ArtifactSpec {
        &self.artifact
    }

    fn load(&self, artifact: &Path) -> Result<Capability, ProviderError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::InvalidArtifact {
                path: artifact.display().to_string(),
                reason: "forced failure".into(),
            });
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok((self.build)())
    }
}

pub struct CountingFetcher {
    calls: Arc<AtomicUsize>,
    stall: bool,
}

#[async_trait]
impl Fetcher for CountingFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.stall {
            std::future::pending::<()>().await;
        }
        Ok(b"artifact".to_vec())
    }
}

#[derive(Default)]
pub struct Fixture {
    cached: bool,
    offline: bool,
    stall_fetch: bool,
    vectors: HashMap<String, Vec<f32>>,
    phrases: Vec<(String, String)>,
}

impl Fixture {
    /// Both artifacts already present in the cache.
    pub fn cached() -> Self {
        Self {
            cached: true,
            ..Default::default()
        }
    }

    /// Empty cache, artifacts downloadable.
    pub fn uncached() -> Self {
        Self::default()
    }

    /// Empty cache and no download url.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Fetches never complete.
    pub fn stalled(mut self) -> Self {
        self.stall_fetch = true;
        self
    }

    pub fn vector(mut self, text: &str, v: &[f32]) -> Self {
        self.vectors.insert(text.to_string(), v.to_vec());
        self
    }

    pub fn phrase(mut self, label: &str, phrase: &str) -> Self {
        self.phrases.push((label.to_string(), phrase.to_string()));
        self
    }

    pub fn build(self) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let spec = |name: &str| ArtifactSpec {
            name: name.to_string(),
            file: format!("{name}.bin"),
            url: (!self.offline).then(|| format!("https://models.invalid/{name}.bin")),
            checksum: None,
        };
        let embedding_spec = spec("fake-embedding");
        let ner_spec = spec("fake-ner");
        if self.cached {
            for s in [&embedding_spec, &ner_spec] {
                std::fs::write(dir.path().join(&s.file), b"artifact").unwrap();
            }
        }

        let embedding_loads = Arc::new(AtomicUsize::new(0));
        let ner_loads = Arc::new(AtomicUsize::new(0));
        let live_embedders = Arc::new(AtomicUsize::new(0));
        let fail_embedding = Arc::new(AtomicBool::new(false));
        let fetches = Arc::new(AtomicUsize::new(0));

        let vectors = self.vectors;
        let live = live_embedders.clone();
        let embedding = CountingFactory {
            kind: ResourceKind::Embedding,
            artifact: embedding_spec,
            loads: embedding_loads.clone(),
            fail: fail_embedding.clone(),
            build: Box::new(move || {
                Capability::Embedding(Box::new(FakeEmbedder::new(vectors.clone(), live.clone())))
            }),
        };
        let phrases = self.phrases;
        let ner = CountingFactory {
            kind: ResourceKind::EntityRecognition,
            artifact: ner_spec,
            loads: ner_loads.clone(),
            fail: Arc::new(AtomicBool::new(false)),
            build: Box::new(move || {
                Capability::EntityRecognition(Box::new(FakeRecognizer {
                    phrases: phrases.clone(),
                }))
            }),
        };

        let registry = CapabilityRegistry::new()
            .with_factory(Arc::new(embedding))
            .with_factory(Arc::new(ner));
        let fetcher = CountingFetcher {
            calls: fetches.clone(),
            stall: self.stall_fetch,
        };
        let store = ArtifactStore::new(dir.path(), Arc::new(fetcher));
        let service = MlService::new(ResourceManager::new(registry, store), AppConfig::default());

        Harness {
            dir,
            service,
            embedding_loads,
            ner_loads,
            live_embedders,
            fail_embedding,
            fetches,
        }
    }
}

pub struct Harness {
    pub dir: TempDir,
    pub service: MlService,
    pub embedding_loads: Arc<AtomicUsize>,
    pub ner_loads: Arc<AtomicUsize>,
    pub live_embedders: Arc<AtomicUsize>,
    pub fail_embedding: Arc<AtomicBool>,
    pub fetches: Arc<AtomicUsize>,
}

impl Harness {
    pub fn manager(&self) -> &ResourceManager {
        self.service.manager()
    }

    pub fn count(counter: &Arc<AtomicUsize>) -> usize {
        counter.load(Ordering::SeqCst)
    }
}
