//! Configuration types for the holocron engine.
//!
//! The engine only recognizes the knobs below; everything else (server
//! addresses, hook wiring, CLI flags) belongs to outer layers.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HolocronConfig {
    /// Store location.
    #[serde(default)]
    pub store: StoreConfig,

    /// Embedding provider selection.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chunker selection.
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Logging verbosity (stderr only).
    #[serde(default)]
    pub log: LogConfig,
}

/// Store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the single database file.
    #[serde(default = "default_persist_path")]
    pub persist_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            persist_path: default_persist_path(),
        }
    }
}

/// Which embedding provider to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// Lexical-only mode: dimension 0, no vector queries.
    Noop,
    /// Ollama HTTP embedding endpoint.
    Ollama,
    /// Local ONNX transformer model.
    Transformers,
}

impl Default for EmbedderKind {
    fn default() -> Self {
        Self::Noop
    }
}

/// Embedding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbedderKind,

    /// Base URL of the Ollama server.
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    /// Model name passed to the Ollama endpoint.
    #[serde(default = "default_embed_model")]
    pub model: String,

    /// Embedding width the provider is expected to return.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// ONNX model file for the transformers provider.
    #[serde(default)]
    pub model_path: Option<PathBuf>,

    /// tokenizer.json for the transformers provider.
    #[serde(default)]
    pub tokenizer_path: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbedderKind::default(),
            base_url: default_ollama_url(),
            model: default_embed_model(),
            dimensions: default_dimensions(),
            model_path: None,
            tokenizer_path: None,
        }
    }
}

/// Which chunker to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkerKind {
    /// Language-aware block boundaries with sliding-window fallback.
    Ast,
    /// Sliding window only.
    Text,
}

impl Default for ChunkerKind {
    fn default() -> Self {
        Self::Ast
    }
}

/// Chunking configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default)]
    pub strategy: ChunkerKind,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// One of "error", "warn", "info", "debug", "trace".
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions

fn default_persist_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".holocron")
        .join("index.db")
}

fn default_ollama_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_embed_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_dimensions() -> usize {
    768
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl HolocronConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            crate::error::HolocronError::config(format!("Failed to parse config: {}", e))
        })?;
        Ok(config)
    }

    /// Load configuration from default paths, falling back to defaults.
    pub fn load_default() -> crate::error::Result<Self> {
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("holocron").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        let local_config = PathBuf::from("holocron.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HolocronConfig::default();
        assert_eq!(config.embedding.provider, EmbedderKind::Noop);
        assert_eq!(config.chunking.strategy, ChunkerKind::Ast);
        assert!(config
            .store
            .persist_path
            .to_string_lossy()
            .contains(".holocron"));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [embedding]
            provider = "ollama"
            model = "mxbai-embed-large"

            [chunking]
            strategy = "text"
        "#;
        let config: HolocronConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.embedding.provider, EmbedderKind::Ollama);
        assert_eq!(config.embedding.model, "mxbai-embed-large");
        assert_eq!(config.chunking.strategy, ChunkerKind::Text);
        // Unset sections keep their defaults
        assert_eq!(config.log.level, "warn");
    }
}
