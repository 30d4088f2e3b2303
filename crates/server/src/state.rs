//! # Application State
//!
//! The shared state (`AppState`) and the logic for building it at startup:
//! instantiating AI providers from configuration, connecting the SQLite
//! knowledge base, and assembling the answering agent.

use crate::config::{AiProviderConfig, AppConfig};
use porseman::{
    agent::AnswerAgent,
    intent::LlmIntentDetector,
    providers::{
        ai::{gemini::GeminiProvider, local::LocalAiProvider, AiProvider, EmbeddingClient},
        db::sqlite::SqliteProvider,
    },
    types::AgentConfig,
};
use std::sync::Arc;

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Arc<AppConfig>,
    /// The knowledge base / chat log provider.
    pub sqlite_provider: Arc<SqliteProvider>,
    /// The answering agent serving `/chat`.
    pub agent: Arc<AnswerAgent<SqliteProvider>>,
    /// The embedding capability, also used by the admin backfill endpoint.
    pub embedder: Option<EmbeddingClient>,
}

/// Instantiates one AI provider from its configuration section.
fn build_ai_provider(name: &str, config: &AiProviderConfig) -> anyhow::Result<Box<dyn AiProvider>> {
    match config.provider.as_str() {
        "gemini" => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                anyhow::anyhow!("api_key is required for gemini provider '{name}'")
            })?;
            // If api_url is not provided in config, construct it from the model name.
            let api_url = config.api_url.clone().unwrap_or_else(|| {
                format!(
                    "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
                    config.model_name
                )
            });
            Ok(Box::new(GeminiProvider::new(api_url, api_key)?))
        }
        "local" => {
            // For local providers, the URL is always required.
            let api_url = config.api_url.clone().ok_or_else(|| {
                anyhow::anyhow!("api_url is required for local provider '{name}'")
            })?;
            Ok(Box::new(LocalAiProvider::new(
                api_url,
                config.api_key.clone(),
                Some(config.model_name.clone()),
            )?))
        }
        other => Err(anyhow::anyhow!(
            "Unsupported AI provider type '{other}' for provider '{name}'"
        )),
    }
}

/// Builds the shared application state from the configuration.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let sqlite_provider = Arc::new(SqliteProvider::new(&config.db_url).await?);
    tracing::info!(db_path = %config.db_url, "Initialized local storage provider (SQLite).");
    // Ensure the database schema is up-to-date on startup.
    sqlite_provider.initialize_schema().await?;

    let embedder = config.embedding.as_ref().map(|e| {
        EmbeddingClient::new(e.api_url.clone(), e.model_name.clone(), e.api_key.clone())
    });

    let agent_config = AgentConfig {
        top_k: config.agent.top_k,
        score_threshold: config.agent.score_threshold,
        max_input_chars: config.agent.max_input_chars,
        ..AgentConfig::default()
    };

    let mut builder = AnswerAgent::builder(Arc::clone(&sqlite_provider)).config(agent_config);

    if let Some(generation) = &config.generation {
        builder = builder.generator(build_ai_provider("generation", generation)?);
    }
    if let Some(classification) = &config.classification {
        let provider = build_ai_provider("classification", classification)?;
        builder = builder.smart_detector(Box::new(LlmIntentDetector::new(provider)));
    }
    if let Some(embedder) = embedder.clone() {
        builder = builder.embedder(embedder);
    }

    Ok(AppState {
        config: Arc::new(config),
        sqlite_provider,
        agent: Arc::new(builder.build()),
        embedder,
    })
}
