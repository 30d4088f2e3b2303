//! # Application Configuration
//!
//! Defines the configuration structure for `porseman-server` and the logic
//! for loading it from an optional `config.yml` plus environment variables.
//! Top-level keys like `port` and `db_url` are overridden by `PORT` and
//! `DB_URL`; nested keys by `PORSEMAN_`-prefixed variables (e.g.
//! `PORSEMAN_EMBEDDING__API_URL`).

use config::{Config as ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

/// The root configuration structure.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The path to the SQLite database file. Loaded from `DB_URL` env var.
    #[serde(default = "default_db_url")]
    pub db_url: String,
    /// Retrieval tuning for the answering agent.
    #[serde(default)]
    pub agent: AgentTuning,
    /// Configuration for the text embedding capability. Optional: without
    /// it, retrieval is keyword-only.
    #[serde(default)]
    pub embedding: Option<EmbeddingProviderConfig>,
    /// Configuration for the answer-rephrasing generation capability.
    #[serde(default)]
    pub generation: Option<AiProviderConfig>,
    /// Configuration for the smart intent classifier. Optional: without it,
    /// classification is keyword-only.
    #[serde(default)]
    pub classification: Option<AiProviderConfig>,
}

fn default_port() -> u16 {
    9090
}

fn default_db_url() -> String {
    "db/porseman.db".to_string()
}

/// Agent tuning values exposed through configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AgentTuning {
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

fn default_top_k() -> u32 {
    5
}

fn default_score_threshold() -> f64 {
    0.35
}

fn default_max_input_chars() -> usize {
    1000
}

impl Default for AgentTuning {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            score_threshold: default_score_threshold(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

/// Configuration for the embedding model provider.
#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingProviderConfig {
    pub api_url: String,
    pub model_name: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// A configuration for a text-generation provider instance.
#[derive(Debug, Deserialize, Clone)]
pub struct AiProviderConfig {
    /// The type of provider (e.g. "gemini", "local").
    pub provider: String,
    /// The API URL. Optional for Gemini, where it can be derived from the
    /// model name.
    #[serde(default)]
    pub api_url: Option<String>,
    /// The API key, which can be null for local providers.
    #[serde(default)]
    pub api_key: Option<String>,
    pub model_name: String,
}

/// Loads the application configuration.
///
/// Layering, lowest priority first: `config.yml` (or the override path),
/// plain environment variables for top-level keys, and `PORSEMAN_`-prefixed
/// environment variables for nested overrides.
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = ConfigBuilder::builder();

    if let Some(path) = config_path_override {
        builder = builder.add_source(File::new(path, FileFormat::Yaml));
    } else if std::path::Path::new("config.yml").exists() {
        builder = builder.add_source(File::new("config.yml", FileFormat::Yaml));
    }

    let settings = builder
        .add_source(Environment::default())
        .add_source(
            Environment::with_prefix("PORSEMAN")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize()
}
