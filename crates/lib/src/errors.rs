use thiserror::Error;

/// Custom error types for the answering agent.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Intent classification failed: {0}")]
    Classification(String),
    #[error("Answer enhancement failed: {0}")]
    Enhancement(String),
    #[error("Chat log persistence failed: {0}")]
    Persistence(String),
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to AI provider: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI provider response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("AI provider returned an error: {0}")]
    AiApi(String),
    #[error("AI provider call timed out after {0}ms")]
    AiTimeout(u64),
    #[error("Storage provider connection error: {0}")]
    StorageConnection(String),
    #[error("Storage operation failed: {0}")]
    StorageOperationFailed(String),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),
}
