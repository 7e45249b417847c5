//! Dictionary-backed entity recognizer.
//!
//! Phrases from the artifact are compiled into a single Aho-Corasick
//! automaton (leftmost-longest, ASCII case-insensitive). A hit only counts
//! when it is not glued to surrounding alphanumerics.

use crate::text::CharIndex;
use crate::{
    ArtifactSpec, Capability, CapabilityFactory, EntityRecognitionCapability, EntitySpan,
    ProviderError, ResourceKind,
};
use aho_corasick::{AhoCorasick, MatchKind};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct GazetteerEntry {
    pub label: String,
    pub phrase: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GazetteerFile {
    pub entries: Vec<GazetteerEntry>,
}

pub struct GazetteerRecognizer {
    automaton: AhoCorasick,
    labels: Vec<String>,
    footprint: usize,
}

impl GazetteerRecognizer {
    pub fn from_entries(entries: Vec<GazetteerEntry>) -> Result<Self, ProviderError> {
        let entries: Vec<GazetteerEntry> = entries
            .into_iter()
            .filter(|e| !e.phrase.trim().is_empty())
            .collect();
        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(entries.iter().map(|e| e.phrase.as_str()))
            .map_err(|e| ProviderError::InvalidArtifact {
                path: "<memory>".into(),
                reason: e.to_string(),
            })?;
        let footprint = automaton.memory_usage()
            + entries
                .iter()
                .map(|e| e.label.len() + e.phrase.len())
                .sum::<usize>();
        Ok(Self {
            automaton,
            labels: entries.into_iter().map(|e| e.label).collect(),
            footprint,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, ProviderError> {
        let raw = std::fs::read(path)?;
        let file: GazetteerFile =
            serde_json::from_slice(&raw).map_err(|e| ProviderError::InvalidArtifact {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Self::from_entries(file.entries)
    }
}

fn is_word_char(c: Option<char>) -> bool {
    c.map(char::is_alphanumeric).unwrap_or(false)
}

impl EntityRecognitionCapability for GazetteerRecognizer {
    fn process(&self, text: &str) -> Result<Vec<EntitySpan>, ProviderError> {
        let index = CharIndex::new(text);
        let mut spans = Vec::new();
        for m in self.automaton.find_iter(text) {
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();
            if is_word_char(before) || is_word_char(after) {
                continue;
            }
            spans.push(EntitySpan {
                label: self.labels[m.pattern().as_usize()].clone(),
                text: text[m.start()..m.end()].to_string(),
                start: index.char_offset(m.start()),
                end: index.char_offset(m.end()),
            });
        }
        Ok(spans)
    }

    fn footprint_bytes(&self) -> usize {
        self.footprint
    }
}

pub struct GazetteerFactory {
    artifact: ArtifactSpec,
}

impl GazetteerFactory {
    pub fn new(artifact: ArtifactSpec) -> Self {
        Self { artifact }
    }
}

impl CapabilityFactory for GazetteerFactory {
    fn kind(&self) -> ResourceKind {
        ResourceKind::EntityRecognition
    }

    fn artifact(&self) -> &ArtifactSpec {
        &self.artifact
    }

    fn load(&self, artifact: &Path) -> Result<Capability, ProviderError> {
        let model = GazetteerRecognizer::from_path(artifact)?;
        Ok(Capability::EntityRecognition(Box::new(model)))
    }
}
