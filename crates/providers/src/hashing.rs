//! Feature-hashing embedder.
//!
//! Word tokens and their character trigrams are hashed with FNV-1a into a
//! fixed number of signed buckets. Per-token weights come from the artifact
//! (typically IDF values); unknown tokens use `default_weight`. Output is not
//! normalized.

use crate::{
    ArtifactSpec, Capability, CapabilityFactory, EmbeddingCapability, ProviderError, ResourceKind,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
const TRIGRAM_SCALE: f32 = 0.5;

#[derive(Debug, Clone, Deserialize)]
pub struct HashingModelFile {
    pub dimensions: usize,
    #[serde(default = "default_weight")]
    pub default_weight: f32,
    #[serde(default)]
    pub weights: HashMap<String, f32>,
}

fn default_weight() -> f32 {
    1.0
}

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
    default_weight: f32,
    weights: HashMap<String, f32>,
}

impl HashingEmbedder {
    pub fn from_model(model: HashingModelFile) -> Result<Self, ProviderError> {
        if model.dimensions == 0 {
            return Err(ProviderError::InvalidArtifact {
                path: "<memory>".into(),
                reason: "dimensions must be positive".into(),
            });
        }
        let weights = model
            .weights
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        Ok(Self {
            dimensions: model.dimensions,
            default_weight: model.default_weight,
            weights,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, ProviderError> {
        let raw = std::fs::read(path)?;
        let model: HashingModelFile =
            serde_json::from_slice(&raw).map_err(|e| ProviderError::InvalidArtifact {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Self::from_model(model)
    }

    fn add_feature(&self, acc: &mut [f32], feature: &str, weight: f32) {
        let h = fnv1a(feature.as_bytes());
        let bucket = (h % self.dimensions as u64) as usize;
        let sign = if (h >> 63) & 1 == 0 { 1.0 } else { -1.0 };
        acc[bucket] += sign * weight;
    }
}

impl EmbeddingCapability for HashingEmbedder {
    fn encode(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let mut acc = vec![0.0f32; self.dimensions];
        for token in tokenize(text) {
            let weight = self
                .weights
                .get(&token)
                .copied()
                .unwrap_or(self.default_weight);
            self.add_feature(&mut acc, &token, weight);

            let padded: Vec<char> = format!("#{token}#").chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                self.add_feature(&mut acc, &gram, weight * TRIGRAM_SCALE);
            }
        }
        Ok(acc)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn footprint_bytes(&self) -> usize {
        self.weights
            .keys()
            .map(|k| k.len() + std::mem::size_of::<f32>())
            .sum()
    }
}

/// Lowercased alphanumeric runs.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |h, b| {
        (h ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

pub struct HashingFactory {
    artifact: ArtifactSpec,
}

impl HashingFactory {
    pub fn new(artifact: ArtifactSpec) -> Self {
        Self { artifact }
    }
}

impl CapabilityFactory for HashingFactory {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Embedding
    }

    fn artifact(&self) -> &ArtifactSpec {
        &self.artifact
    }

    fn load(&self, artifact: &Path) -> Result<Capability, ProviderError> {
        let model = HashingEmbedder::from_path(artifact)?;
        Ok(Capability::Embedding(Box::new(model)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(dims: usize) -> HashingEmbedder {
        HashingEmbedder::from_model(HashingModelFile {
            dimensions: dims,
            default_weight: 1.0,
            weights: HashMap::from([("invoice".to_string(), 3.0)]),
        })
        .unwrap()
    }

    #[test]
    fn encode_is_deterministic() {
        let m = model(64);
        let a = m.encode("Quarterly invoice.pdf").unwrap();
        let b = m.encode("Quarterly invoice.pdf").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn case_and_punctuation_do_not_matter() {
        let m = model(64);
        assert_eq!(
            m.encode("Tax RECEIPT").unwrap(),
            m.encode("tax, receipt!").unwrap()
        );
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let m = model(16);
        assert!(m.encode("   ").unwrap().iter().all(|x| *x == 0.0));
    }

    #[test]
    fn zero_dimensions_rejected() {
        let err = HashingEmbedder::from_model(HashingModelFile {
            dimensions: 0,
            default_weight: 1.0,
            weights: HashMap::new(),
        });
        assert!(matches!(err, Err(ProviderError::InvalidArtifact { .. })));
    }

    #[test]
    fn loads_from_json_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embed.json");
        std::fs::write(&path, r#"{"dimensions": 8, "weights": {"Report": 2.0}}"#).unwrap();
        let factory = HashingFactory::new(ArtifactSpec {
            name: "hashing".into(),
            file: "embed.json".into(),
            url: None,
            checksum: None,
        });
        let cap = factory.load(&path).unwrap();
        assert_eq!(cap.kind(), ResourceKind::Embedding);
        match cap {
            Capability::Embedding(m) => assert_eq!(m.dimensions(), 8),
            other => panic!("unexpected capability {other:?}"),
        }
    }
}
