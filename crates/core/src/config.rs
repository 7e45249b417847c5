use providers::ArtifactSpec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub redaction: RedactionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    #[serde(default = "default_embedding")]
    pub embedding: ModelConfig,
    #[serde(default = "default_entity_recognition")]
    pub entity_recognition: ModelConfig,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            embedding: default_embedding(),
            entity_recognition: default_entity_recognition(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub backend: String,
    pub file: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub checksum: Option<String>,
}

impl ModelConfig {
    pub fn artifact(&self) -> ArtifactSpec {
        ArtifactSpec {
            name: self.backend.clone(),
            file: self.file.clone(),
            url: self.url.clone(),
            checksum: self.checksum.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionConfig {
    #[serde(default = "default_redaction_char")]
    pub char: char,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            char: default_redaction_char(),
        }
    }
}

fn default_cache_dir() -> String {
    "models".to_string()
}

fn default_embedding() -> ModelConfig {
    ModelConfig {
        backend: "hashing".to_string(),
        file: "embedding/hashing-384.json".to_string(),
        url: None,
        checksum: None,
    }
}

fn default_entity_recognition() -> ModelConfig {
    ModelConfig {
        backend: "gazetteer".to_string(),
        file: "ner/gazetteer-en.json".to_string(),
        url: None,
        checksum: None,
    }
}

fn default_threshold() -> f32 {
    0.3
}

fn default_top_k() -> usize {
    10
}

fn default_redaction_char() -> char {
    '*'
}

/// Loads `path` (or `config/default` if present), then applies
/// `ML_SERVICE__SECTION__KEY` environment overrides.
pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("ML_SERVICE")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.toml");
        std::fs::write(&path, "").unwrap();
        let cfg = load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(cfg.search.top_k, 10);
        assert!((cfg.search.threshold - 0.3).abs() < f32::EPSILON);
        assert_eq!(cfg.redaction.char, '*');
        assert_eq!(cfg.models.embedding.backend, "hashing");
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("svc.toml");
        std::fs::write(
            &path,
            r#"
            [models]
            cache_dir = "/var/cache/ml"

            [models.embedding]
            backend = "hashing"
            file = "e.json"
            url = "https://example.invalid/e.json"

            [search]
            top_k = 3
            "#,
        )
        .unwrap();
        let cfg = load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(cfg.models.cache_dir, "/var/cache/ml");
        assert_eq!(
            cfg.models.embedding.artifact().url.as_deref(),
            Some("https://example.invalid/e.json")
        );
        assert_eq!(cfg.models.entity_recognition.backend, "gazetteer");
        assert_eq!(cfg.search.top_k, 3);
    }
}
