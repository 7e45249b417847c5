//! Core library: resource management, semantic search, tagging, PII detection and redaction.

pub mod classifier;
pub mod config;
pub mod embeddings;
pub mod manager;
pub mod models;
pub mod patterns;
pub mod pii;
pub mod redaction;
pub mod search;
pub mod sensitivity;
pub mod service;

pub use manager::{ResourceLoadError, ResourceManager};
pub use service::{MlService, ServiceError};
