use crate::models::EmbeddingOutput;
use providers::{EmbeddingCapability, ProviderError};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimilarityError {
    #[error("dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

pub fn embed(model: &dyn EmbeddingCapability, text: &str) -> Result<Vec<f32>, ProviderError> {
    model.encode(text)
}

/// Embedding plus its dimensionality, as reported to callers.
pub fn embed_with_dimensions(
    model: &dyn EmbeddingCapability,
    text: &str,
) -> Result<EmbeddingOutput, ProviderError> {
    let embedding = model.encode(text)?;
    Ok(EmbeddingOutput {
        dimensions: embedding.len(),
        embedding,
    })
}

/// Cosine similarity. Zero when either vector has zero norm.
///
/// Accumulates in f64 so results do not depend on summation precision.
pub fn similarity(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())) as f32)
}
