use crate::embeddings::{embed, similarity};
use crate::models::{Candidate, RankedResult};
use providers::{EmbeddingCapability, ProviderError};
use std::cmp::Ordering;
use tracing::{debug, warn};

pub const DEFAULT_THRESHOLD: f32 = 0.3;
pub const DEFAULT_TOP_K: usize = 10;

/// Ranks `candidates` by cosine similarity of their composite text to `query`.
///
/// Only the query embedding can fail the whole call. A candidate that cannot
/// be embedded or scored is logged and skipped. Results keep scores
/// `>= threshold` (a negative threshold is treated as 0), sorted by
/// descending score with ties left in candidate order, truncated to `top_k`.
pub fn search(
    model: &dyn EmbeddingCapability,
    query: &str,
    candidates: &[Candidate],
    threshold: f32,
    top_k: usize,
) -> Result<Vec<RankedResult>, ProviderError> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }
    let threshold = threshold.max(0.0);
    let query_vec = embed(model, query)?;

    let mut results = Vec::new();
    for candidate in candidates {
        let vector = match embed(model, &candidate.composite_text()) {
            Ok(v) => v,
            Err(e) => {
                warn!(id = %candidate.id, error = %e, "Skipping candidate: embedding failed");
                continue;
            }
        };
        let score = match similarity(&query_vec, &vector) {
            Ok(s) => s,
            Err(e) => {
                warn!(id = %candidate.id, error = %e, "Skipping candidate: scoring failed");
                continue;
            }
        };
        if score >= threshold {
            results.push(RankedResult {
                id: candidate.id.clone(),
                name: candidate.name.clone(),
                score,
            });
        }
    }

    // sort_by is stable; equal scores stay in input order.
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    results.truncate(top_k);
    debug!(candidates = candidates.len(), kept = results.len(), "Search complete");
    Ok(results)
}
