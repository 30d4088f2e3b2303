pub mod embedding;
pub mod gemini;
pub mod local;

use crate::errors::AgentError;
use async_trait::async_trait;
use dyn_clone::DynClone;
pub use embedding::{generate_embedding, EmbeddingClient};
use std::fmt::Debug;

/// A trait for interacting with an AI text-generation provider.
///
/// This defines a common interface over different Large Language Models
/// (e.g. Gemini, a local OpenAI-compatible server). The agent treats it as
/// an optional capability: absence or failure degrades the pipeline, it
/// never breaks it.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// Generates a response from a given system and user prompt.
    async fn generate(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, AgentError>;
}

dyn_clone::clone_trait_object!(AiProvider);
