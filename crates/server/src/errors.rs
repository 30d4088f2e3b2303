use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use porseman::AgentError;
use serde_json::json;
use tracing::error;

/// A custom error type for the server application.
///
/// Encapsulates the different kinds of errors that can occur within the
/// server, converting each into a structured JSON response. A caller never
/// sees a bare 5xx without a body.
pub enum AppError {
    /// Errors originating from the `porseman` library.
    Agent(AgentError),
    /// A required optional capability is not configured.
    NotConfigured(String),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

impl From<AgentError> for AppError {
    fn from(err: AgentError) -> Self {
        AppError::Agent(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = match self {
            AppError::Agent(err) => {
                // Log the original error for debugging purposes
                error!("AgentError: {:?}", err);
                match err {
                    AgentError::Validation(e) => {
                        (StatusCode::BAD_REQUEST, format!("Invalid request: {e}"))
                    }
                    AgentError::AiRequest(e) => (
                        StatusCode::BAD_GATEWAY,
                        format!("Request to AI provider failed: {e}"),
                    ),
                    AgentError::AiDeserialization(e) => (
                        StatusCode::BAD_GATEWAY,
                        format!("Failed to deserialize AI provider response: {e}"),
                    ),
                    AgentError::AiApi(e) => {
                        (StatusCode::BAD_GATEWAY, format!("AI provider error: {e}"))
                    }
                    AgentError::AiTimeout(ms) => (
                        StatusCode::BAD_GATEWAY,
                        format!("AI provider call timed out after {ms}ms"),
                    ),
                    AgentError::Classification(e) => (
                        StatusCode::BAD_GATEWAY,
                        format!("Intent classification failed: {e}"),
                    ),
                    AgentError::Enhancement(e) => (
                        StatusCode::BAD_GATEWAY,
                        format!("Answer enhancement failed: {e}"),
                    ),
                    AgentError::StorageConnection(e) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Storage provider connection error: {e}"),
                    ),
                    AgentError::StorageOperationFailed(e) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Storage operation failed: {e}"),
                    ),
                    AgentError::Persistence(e) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Chat log persistence failed: {e}"),
                    ),
                    AgentError::Regex(e) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Internal regex error: {e}"),
                    ),
                    AgentError::JsonSerialization(e) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Failed to serialize result: {e}"),
                    ),
                    AgentError::ReqwestClientBuild(e) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Failed to build HTTP client: {e}"),
                    ),
                }
            }
            AppError::NotConfigured(capability) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Capability '{capability}' is not configured on this server."),
            ),
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status_code, body).into_response()
    }
}
