//! Typed error for the chat-chain crate.

use llm_endpoint::{ConfigError, EndpointError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    /// Invalid or missing configuration.
    #[error(transparent)]
    Config(ConfigError),

    /// Errors from the text-generation endpoint.
    #[error("endpoint error: {0}")]
    Endpoint(EndpointError),

    /// The retrieval index answered with a non-success status.
    #[error("retrieval error: HTTP {status} from {url}: {snippet}")]
    RetrievalStatus {
        status: reqwest::StatusCode,
        url: String,
        snippet: String,
    },

    /// HTTP/transport errors when calling the retrieval index.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization issues.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ConfigError> for ChainError {
    fn from(e: ConfigError) -> Self {
        ChainError::Config(e)
    }
}

impl From<EndpointError> for ChainError {
    fn from(e: EndpointError) -> Self {
        match e {
            EndpointError::Config(c) => ChainError::Config(c),
            other => ChainError::Endpoint(other),
        }
    }
}
