//! Exclusive owner of the heavyweight inference capabilities.
//!
//! At most one capability is resident at a time. Asking for a different kind
//! evicts the current one before the new one is constructed, which keeps the
//! process under a fixed memory ceiling. Interleaving requests for different
//! kinds therefore reloads on every switch; that cost is accepted.
//!
//! Handles are leases: they hold the manager lock for as long as they live,
//! so use of the loaded instance is serialized along with its loading and no
//! handle can outlive an eviction.

use providers::{
    ArtifactStore, Capability, CapabilityRegistry, EmbeddingCapability,
    EntityRecognitionCapability, Probe, ProviderError, ResourceKind,
};
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMappedMutexGuard, OwnedMutexGuard};
use tracing::{debug, error, info};

/// Names the out-of-band step that populates the artifact cache.
pub const BOOTSTRAP_HINT: &str =
    "run `ml-service fetch-models` to download the required model artifacts";

#[derive(Debug, Error)]
#[error("failed to load {kind} capability: {source}; {hint}")]
pub struct ResourceLoadError {
    pub kind: ResourceKind,
    pub hint: String,
    #[source]
    pub source: ProviderError,
}

impl ResourceLoadError {
    pub fn new(kind: ResourceKind, source: ProviderError) -> Self {
        Self {
            kind,
            hint: BOOTSTRAP_HINT.to_string(),
            source,
        }
    }
}

/// Either empty or holding exactly one capability.
#[derive(Debug, Default)]
pub struct ManagerState {
    loaded: Option<Capability>,
}

impl ManagerState {
    pub fn kind(&self) -> Option<ResourceKind> {
        self.loaded.as_ref().map(Capability::kind)
    }
}

pub type Lease = OwnedMappedMutexGuard<ManagerState, Capability>;
pub type EmbeddingLease = OwnedMappedMutexGuard<ManagerState, Box<dyn EmbeddingCapability>>;
pub type EntityRecognitionLease =
    OwnedMappedMutexGuard<ManagerState, Box<dyn EntityRecognitionCapability>>;

#[derive(Debug, Default)]
struct Counters {
    load_count: AtomicU64,
    unload_count: AtomicU64,
    cache_hits: AtomicU64,
    load_failures: AtomicU64,
    fetch_count: AtomicU64,
}

/// Point-in-time snapshot of manager activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManagerStats {
    pub load_count: u64,
    pub unload_count: u64,
    pub cache_hits: u64,
    pub load_failures: u64,
    pub fetch_count: u64,
}

pub struct ResourceManager {
    state: Arc<Mutex<ManagerState>>,
    registry: CapabilityRegistry,
    store: ArtifactStore,
    counters: Counters,
}

impl ResourceManager {
    pub fn new(registry: CapabilityRegistry, store: ArtifactStore) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManagerState::default())),
            registry,
            store,
            counters: Counters::default(),
        }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Returns a lease on the capability of `kind`, loading it if needed.
    ///
    /// If `kind` is already resident the existing instance is returned as is.
    /// Otherwise the resident instance (if any) is released first. On failure
    /// the manager is left empty, never holding a partially built instance;
    /// the same holds if this future is dropped mid-construction.
    pub async fn acquire(&self, kind: ResourceKind) -> Result<Lease, ResourceLoadError> {
        let mut state = self.state.clone().lock_owned().await;

        if state.kind() == Some(kind) {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!(kind = %kind, "Capability already loaded");
        } else {
            release(&mut state, &self.counters);
            info!(kind = %kind, "Loading capability...");
            match self.construct(kind).await {
                Ok(capability) => {
                    state.loaded = Some(capability);
                    self.counters.load_count.fetch_add(1, Ordering::Relaxed);
                    info!(kind = %kind, "Capability loaded");
                }
                Err(source) => {
                    self.counters.load_failures.fetch_add(1, Ordering::Relaxed);
                    error!(kind = %kind, error = %source, "Capability load failed");
                    return Err(ResourceLoadError::new(kind, source));
                }
            }
        }

        OwnedMutexGuard::try_map(state, |s| s.loaded.as_mut())
            .map_err(|_| ResourceLoadError::new(kind, ProviderError::UnknownKind(kind)))
    }

    pub async fn embedding(&self) -> Result<EmbeddingLease, ResourceLoadError> {
        let lease = self.acquire(ResourceKind::Embedding).await?;
        OwnedMappedMutexGuard::try_map(lease, |c| match c {
            Capability::Embedding(m) => Some(m),
            _ => None,
        })
        .map_err(|lease| mismatch(ResourceKind::Embedding, &lease))
    }

    pub async fn entity_recognizer(&self) -> Result<EntityRecognitionLease, ResourceLoadError> {
        let lease = self.acquire(ResourceKind::EntityRecognition).await?;
        OwnedMappedMutexGuard::try_map(lease, |c| match c {
            Capability::EntityRecognition(m) => Some(m),
            _ => None,
        })
        .map_err(|lease| mismatch(ResourceKind::EntityRecognition, &lease))
    }

    /// Releases whatever is loaded. Waits for in-flight leases, never fails.
    pub async fn cleanup(&self) {
        info!("Cleaning up capabilities...");
        let mut state = self.state.lock().await;
        release(&mut state, &self.counters);
        info!("Cleanup complete");
    }

    pub async fn loaded_kind(&self) -> Option<ResourceKind> {
        self.state.lock().await.kind()
    }

    pub fn stats(&self) -> ManagerStats {
        ManagerStats {
            load_count: self.counters.load_count.load(Ordering::Relaxed),
            unload_count: self.counters.unload_count.load(Ordering::Relaxed),
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            load_failures: self.counters.load_failures.load(Ordering::Relaxed),
            fetch_count: self.counters.fetch_count.load(Ordering::Relaxed),
        }
    }

    async fn construct(&self, kind: ResourceKind) -> Result<Capability, ProviderError> {
        let factory = self.registry.factory(kind)?;
        let spec = factory.artifact().clone();
        let path = match self.store.probe(&spec) {
            Probe::Found(path) => path,
            Probe::Missing(path) => {
                info!(
                    kind = %kind,
                    path = %path.display(),
                    "Artifact not cached, fetching (one-time)..."
                );
                self.counters.fetch_count.fetch_add(1, Ordering::Relaxed);
                self.store.fetch(&spec).await?
            }
        };

        let capability = tokio::task::spawn_blocking(move || factory.load(&path))
            .await
            .map_err(|e| ProviderError::LoadAborted(e.to_string()))??;

        if capability.kind() != kind {
            return Err(ProviderError::KindMismatch {
                expected: kind,
                actual: capability.kind(),
            });
        }
        Ok(capability)
    }
}

fn mismatch(expected: ResourceKind, lease: &Lease) -> ResourceLoadError {
    ResourceLoadError::new(
        expected,
        ProviderError::KindMismatch {
            expected,
            actual: lease.kind(),
        },
    )
}

/// Unloading step. Runs under the state lock so nobody observes it half done.
fn release(state: &mut ManagerState, counters: &Counters) {
    let Some(mut capability) = state.loaded.take() else {
        return;
    };
    let kind = capability.kind();
    let freed_bytes = capability.footprint_bytes();
    let outcome = std::panic::catch_unwind(AssertUnwindSafe(move || {
        capability.release();
        drop(capability);
    }));
    counters.unload_count.fetch_add(1, Ordering::Relaxed);
    match outcome {
        Ok(()) => info!(kind = %kind, freed_bytes, "Capability unloaded"),
        Err(_) => error!(kind = %kind, "Capability release panicked; instance discarded"),
    }
}
