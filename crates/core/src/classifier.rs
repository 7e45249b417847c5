//! Embedding-based file tagging against a fixed set of categories.

use crate::embeddings::{embed, similarity};
use providers::{EmbeddingCapability, ProviderError};
use std::cmp::Ordering;
use tracing::warn;

pub const TAG_THRESHOLD: f32 = 0.4;
pub const MAX_TAGS: usize = 3;

pub struct TagCategory {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

impl TagCategory {
    /// The phrase embedded to represent this category.
    pub fn canonical_phrase(&self) -> String {
        self.keywords.join(" ")
    }
}

/// Declaration order doubles as the tie-break order.
pub const TAG_CATEGORIES: &[TagCategory] = &[
    TagCategory {
        name: "work",
        keywords: &["work", "business", "project", "meeting", "presentation", "report"],
    },
    TagCategory {
        name: "personal",
        keywords: &["personal", "family", "vacation", "photo", "memory"],
    },
    TagCategory {
        name: "finance",
        keywords: &["invoice", "receipt", "tax", "payment", "budget", "financial"],
    },
    TagCategory {
        name: "legal",
        keywords: &["contract", "agreement", "legal", "terms", "policy"],
    },
    TagCategory {
        name: "education",
        keywords: &["course", "lecture", "study", "notes", "assignment", "homework"],
    },
    TagCategory {
        name: "creative",
        keywords: &["design", "art", "music", "video", "creative", "draft"],
    },
    TagCategory {
        name: "technical",
        keywords: &["code", "technical", "documentation", "manual", "guide", "api"],
    },
];

/// Up to three category names whose phrase scores above the tag threshold
/// against the file name (plus preview, when given).
///
/// Category phrases are embedded on every call.
pub fn generate_file_tags(
    model: &dyn EmbeddingCapability,
    filename: &str,
    preview: Option<&str>,
) -> Result<Vec<String>, ProviderError> {
    let text = match preview {
        Some(p) if !p.is_empty() => format!("{filename} {p}"),
        _ => filename.to_string(),
    };
    let text_vec = embed(model, &text)?;

    let mut scored: Vec<(&'static str, f32)> = Vec::new();
    for category in TAG_CATEGORIES {
        let score = embed(model, &category.canonical_phrase())
            .map_err(|e| e.to_string())
            .and_then(|v| similarity(&text_vec, &v).map_err(|e| e.to_string()));
        match score {
            Ok(s) if s > TAG_THRESHOLD => scored.push((category.name, s)),
            Ok(_) => {}
            Err(e) => warn!(category = category.name, error = %e, "Skipping tag category"),
        }
    }

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    Ok(scored
        .into_iter()
        .take(MAX_TAGS)
        .map(|(name, _)| name.to_string())
        .collect())
}
